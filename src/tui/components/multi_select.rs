//! # Multi-select
//!
//! Any number of options out of a list. Space toggles the highlighted
//! option; the value lists selected options in the order they were picked.
//!
//! Unbound keys either toggle everything (`a`, filtering off) or edit the
//! search string (filtering on). The filter keeps the highlight on the
//! option that was under it before the edit, when it is still visible.

use crate::core::action::{Action, ActionHandler};
use crate::core::events::{EventKind, Signal};
use crate::core::key::{Key, KeyName};
use crate::core::state::Session;
use crate::core::text::{edit_value, wrap_index};
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};
use crate::tui::validate::ValidateFn;

use super::{filter_by_label, wrap_validate};

const REQUIRED_MESSAGE: &str = "Please select at least one option. Press `space` to select";

#[derive(Debug, Clone, PartialEq)]
pub struct MultiSelectOption<V> {
    pub label: String,
    pub value: V,
    pub hint: String,
    /// Starts selected when the prompt has no explicit initial value.
    pub selected: bool,
}

impl<V> MultiSelectOption<V> {
    pub fn new(value: V, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            hint: String::new(),
            selected: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn preselected(mut self) -> Self {
        self.selected = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MultiSelectState<V> {
    pub options: Vec<MultiSelectOption<V>>,
    pub all_options: Vec<MultiSelectOption<V>>,
    pub filter: bool,
    pub search: String,
    pub required: bool,
}

pub type MultiSelectPrompt<V> = Prompt<Vec<V>, MultiSelectState<V>>;
type MultiSelectSession<V> = Session<Vec<V>, MultiSelectState<V>>;

pub struct MultiSelectParams<V> {
    pub options: PromptOptions,
    pub choices: Vec<MultiSelectOption<V>>,
    /// Values selected up front. When empty, pre-selected options are used.
    pub initial_value: Vec<V>,
    pub filter: bool,
    pub required: bool,
    pub validate: Option<ValidateFn<Vec<V>>>,
    pub render: Option<RenderFn<Vec<V>, MultiSelectState<V>>>,
}

impl<V> Default for MultiSelectParams<V> {
    fn default() -> Self {
        Self {
            options: PromptOptions::default(),
            choices: Vec::new(),
            initial_value: Vec::new(),
            filter: false,
            required: false,
            validate: None,
            render: None,
        }
    }
}

pub fn multi_select<V>(params: MultiSelectParams<V>) -> Result<MultiSelectPrompt<V>, PromptError>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    const NAME: &str = "MultiSelectPrompt";
    if params.render.is_none() {
        return Err(PromptError::MissingParam {
            prompt: NAME,
            param: "render",
        });
    }
    if params.choices.is_empty() {
        return Err(PromptError::MissingParam {
            prompt: NAME,
            param: "options",
        });
    }

    let initial_value = if params.initial_value.is_empty() {
        params
            .choices
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.clone())
            .collect()
    } else {
        params.initial_value
    };

    let mut prompt = Prompt::named(
        NAME,
        PromptParams {
            options: params.options,
            initial_value,
            cursor: 0,
            validate: wrap_validate(params.validate, params.required, REQUIRED_MESSAGE),
            render: params.render,
            widget: MultiSelectState {
                options: params.choices.clone(),
                all_options: params.choices,
                filter: params.filter,
                search: String::new(),
                required: params.required,
            },
        },
    )?;

    let mut handler = ActionHandler::new()
        .on(Action::Up, |s: &mut MultiSelectSession<V>| move_cursor(s, -1))
        .on(Action::Down, |s: &mut MultiSelectSession<V>| move_cursor(s, 1))
        .on(Action::Left, |s: &mut MultiSelectSession<V>| move_cursor(s, -1))
        .on(Action::Right, |s: &mut MultiSelectSession<V>| move_cursor(s, 1))
        .on(Action::Home, |s: &mut MultiSelectSession<V>| s.cursor = 0)
        .on(Action::End, |s: &mut MultiSelectSession<V>| {
            s.cursor = s.widget.options.len().saturating_sub(1)
        })
        .on(Action::Space, toggle_option)
        .fallback(|s: &mut MultiSelectSession<V>, key: &Key| {
            if s.widget.filter {
                filter_options(s, key);
            } else if key.name == KeyName::Char('a') {
                toggle_all(s);
            }
        });

    prompt.on(EventKind::Key, move |s, signal| {
        if let Signal::Key(key) = signal {
            let action = s.resolve(key);
            handler.dispatch(action, s, key);
        }
    });
    Ok(prompt)
}

fn move_cursor<V>(s: &mut MultiSelectSession<V>, step: isize) {
    s.cursor = wrap_index(s.cursor as isize + step, s.widget.options.len());
}

fn toggle_option<V: Clone + PartialEq>(s: &mut MultiSelectSession<V>) {
    let Some(option) = s.widget.options.get(s.cursor) else {
        return;
    };
    match s.value.iter().position(|v| v == &option.value) {
        Some(i) => {
            s.value.remove(i);
        }
        None => s.value.push(option.value.clone()),
    }
}

/// Select every visible option, or clear the selection when all are selected.
fn toggle_all<V: Clone>(s: &mut MultiSelectSession<V>) {
    if s.value.len() == s.widget.options.len() {
        s.value.clear();
    } else {
        s.value = s.widget.options.iter().map(|o| o.value.clone()).collect();
    }
}

fn filter_options<V: Clone + PartialEq>(s: &mut MultiSelectSession<V>, key: &Key) {
    let current = s.widget.options.get(s.cursor).map(|o| o.value.clone());
    let search = &s.widget.search;
    let (search, _) = edit_value(key, search, search.len());
    let (visible, cursor) = filter_by_label(
        &s.widget.all_options,
        &search,
        |o| o.label.as_str(),
        |o| current.as_ref() == Some(&o.value),
    );
    s.widget.search = search;
    s.widget.options = visible;
    s.cursor = cursor;
}

impl<V: PartialEq> Session<Vec<V>, MultiSelectState<V>> {
    pub fn is_selected(&self, value: &V) -> bool {
        self.value.contains(value)
    }

    /// The highlighted option, if any is visible.
    pub fn highlighted(&self) -> Option<&MultiSelectOption<V>> {
        self.widget.options.get(self.cursor)
    }
}
