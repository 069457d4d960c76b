//! # Actions
//!
//! Every key a prompt receives is resolved to an `Action` through an alias
//! table. Widgets never match on raw keys for navigation; they register a
//! handler per action and let the table decide which keys mean "up".
//!
//! ```text
//! Key  →  AliasTable::resolve()  →  Action  →  ActionHandler::dispatch()
//! ```
//!
//! The process-wide table is seeded with the built-in bindings. Hosts may add
//! bindings (vi-style `k`/`j`, for instance) but never replace one: the first
//! registration of a key wins. Mutate it once at startup, before any prompt
//! runs; concurrent writers are not supported.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{LazyLock, PoisonError, RwLock};

use log::debug;
use serde::{Deserialize, Serialize};

use super::key::{Key, KeyName};

/// Semantic meaning of a key after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Space,
    Submit,
    Cancel,
    /// No binding: the key goes to the widget's default handler.
    Default,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Action::Up),
            "down" => Ok(Action::Down),
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            "home" => Ok(Action::Home),
            "end" => Ok(Action::End),
            "space" => Ok(Action::Space),
            "submit" => Ok(Action::Submit),
            "cancel" => Ok(Action::Cancel),
            "default" => Ok(Action::Default),
            other => Err(format!("unknown action: {other:?}")),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Mapping from key name to action.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    bindings: HashMap<KeyName, Action>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let bindings = HashMap::from([
            (KeyName::Up, Action::Up),
            (KeyName::Down, Action::Down),
            (KeyName::Left, Action::Left),
            (KeyName::Right, Action::Right),
            (KeyName::Home, Action::Home),
            (KeyName::End, Action::End),
            (KeyName::Space, Action::Space),
            (KeyName::Enter, Action::Submit),
            (KeyName::Cancel, Action::Cancel),
            (KeyName::Escape, Action::Cancel),
        ]);
        Self { bindings }
    }
}

impl AliasTable {
    /// A table with no bindings at all.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Resolve a key to its action, `Action::Default` when unbound.
    pub fn resolve(&self, key: &Key) -> Action {
        self.get(&key.name).unwrap_or(Action::Default)
    }

    pub fn get(&self, name: &KeyName) -> Option<Action> {
        self.bindings.get(name).copied()
    }

    /// Merge bindings, keeping any binding that already exists.
    ///
    /// Returns how many new bindings were added.
    pub fn merge<I>(&mut self, bindings: I) -> usize
    where
        I: IntoIterator<Item = (KeyName, Action)>,
    {
        let mut added = 0;
        for (name, action) in bindings {
            if let std::collections::hash_map::Entry::Vacant(slot) = self.bindings.entry(name) {
                slot.insert(action);
                added += 1;
            }
        }
        added
    }

    /// Remove a binding from this table. Only meaningful on a per-prompt copy.
    pub fn unbind(&mut self, name: &KeyName) -> Option<Action> {
        self.bindings.remove(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

static ALIASES: LazyLock<RwLock<AliasTable>> = LazyLock::new(|| RwLock::new(AliasTable::default()));

/// Snapshot of the process-wide alias table.
pub fn global_aliases() -> AliasTable {
    ALIASES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Add bindings to the process-wide table; existing bindings are never overwritten.
pub fn update_aliases<I>(bindings: I) -> usize
where
    I: IntoIterator<Item = (KeyName, Action)>,
{
    let mut table = ALIASES.write().unwrap_or_else(PoisonError::into_inner);
    let added = table.merge(bindings);
    debug!("Alias table updated: {} new bindings, {} total", added, table.len());
    added
}

type ActionListener<S> = Box<dyn FnMut(&mut S)>;
type FallbackListener<S> = Box<dyn FnMut(&mut S, &Key)>;

/// Per-widget dispatcher from resolved actions to handlers.
///
/// A registered action runs its handler. An action registered as ignored
/// swallows the key. Anything else falls through to the fallback handler
/// (free text entry, filter capture), or is dropped when there is none.
pub struct ActionHandler<S> {
    handlers: HashMap<Action, Option<ActionListener<S>>>,
    fallback: Option<FallbackListener<S>>,
}

impl<S> Default for ActionHandler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ActionHandler<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: None,
        }
    }

    pub fn on<F>(mut self, action: Action, handler: F) -> Self
    where
        F: FnMut(&mut S) + 'static,
    {
        self.handlers.insert(action, Some(Box::new(handler)));
        self
    }

    /// Claim an action without doing anything, so it never reaches the fallback.
    pub fn ignore(mut self, action: Action) -> Self {
        self.handlers.insert(action, None);
        self
    }

    pub fn fallback<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&mut S, &Key) + 'static,
    {
        self.fallback = Some(Box::new(handler));
        self
    }

    /// Run the handler for `action`, or the fallback with the raw key.
    pub fn dispatch(&mut self, action: Action, state: &mut S, key: &Key) {
        if action != Action::Default
            && let Some(handler) = self.handlers.get_mut(&action)
        {
            if let Some(handler) = handler {
                handler(state);
            }
            return;
        }
        if let Some(fallback) = self.fallback.as_mut() {
            fallback(state, key);
        }
    }
}
