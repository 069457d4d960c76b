//! Prompt lifecycle state and the per-session data handed to listeners and
//! render callbacks.

use std::fmt;
use std::time::Duration;

use super::action::{Action, AliasTable};
use super::key::Key;

/// The six-state prompt lifecycle. `Cancel` and `Submit` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PromptState {
    #[default]
    Initial,
    Active,
    Validating,
    Error,
    Cancel,
    Submit,
}

impl PromptState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PromptState::Cancel | PromptState::Submit)
    }
}

impl fmt::Display for PromptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PromptState::Initial => "initial",
            PromptState::Active => "active",
            PromptState::Validating => "validating",
            PromptState::Error => "error",
            PromptState::Cancel => "cancel",
            PromptState::Submit => "submit",
        };
        f.write_str(label)
    }
}

/// Everything a render callback can see, and everything a key listener may
/// change.
///
/// `W` carries widget-specific state (option lists, filter text, labels).
/// Listeners own `value`, `cursor` and `widget`. The prompt's run loop
/// writes `error` and the validation fields, and drives `state`, except
/// that a Key listener may decide the outcome by setting `state` to
/// `Submit` or `Cancel`; the prompt then skips its own key resolution and
/// goes straight to Finalize.
#[derive(Debug, Clone)]
pub struct Session<T, W = ()> {
    pub state: PromptState,
    pub value: T,
    pub cursor: usize,
    /// Message from the last failed validation; empty otherwise.
    pub error: String,
    /// How long the current validation has been running, updated by ticks.
    pub validation_duration: Duration,
    pub is_validating: bool,
    pub widget: W,
    aliases: AliasTable,
}

impl<T, W> Session<T, W> {
    pub fn new(value: T, cursor: usize, widget: W, aliases: AliasTable) -> Self {
        Self {
            state: PromptState::Initial,
            value,
            cursor,
            error: String::new(),
            validation_duration: Duration::ZERO,
            is_validating: false,
            widget,
            aliases,
        }
    }

    /// Resolve a key through this session's alias table.
    pub fn resolve(&self, key: &Key) -> Action {
        self.aliases.resolve(key)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
}
