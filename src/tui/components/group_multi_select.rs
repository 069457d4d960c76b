//! # Grouped multi-select
//!
//! A multi-select whose options are listed under group headers. Groups and
//! options are flattened into one list of rows; the cursor walks the rows.
//! Space on an option toggles it, Space on a group header selects every
//! option in the group, or clears them all when they are already selected.
//!
//! With `disabled_groups` the headers are labels only: the cursor skips
//! them and they never count as selected.

use crate::core::action::{Action, ActionHandler};
use crate::core::events::{EventKind, Signal};
use crate::core::state::Session;
use crate::core::text::wrap_index;
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};
use crate::tui::validate::ValidateFn;

use super::multi_select::MultiSelectOption;
use super::wrap_validate;

const REQUIRED_MESSAGE: &str = "Please select at least one option. Press `space` to select";

/// A labelled group of options, as passed in by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionGroup<V> {
    pub label: String,
    pub options: Vec<MultiSelectOption<V>>,
}

impl<V> OptionGroup<V> {
    pub fn new(label: impl Into<String>, options: Vec<MultiSelectOption<V>>) -> Self {
        Self {
            label: label.into(),
            options,
        }
    }
}

/// One line of the flattened list.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupRow<V> {
    Group { label: String, members: Vec<V> },
    Option(MultiSelectOption<V>),
}

impl<V> GroupRow<V> {
    pub fn label(&self) -> &str {
        match self {
            GroupRow::Group { label, .. } => label,
            GroupRow::Option(option) => &option.label,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, GroupRow::Group { .. })
    }
}

#[derive(Debug, Clone)]
pub struct GroupMultiSelectState<V> {
    pub rows: Vec<GroupRow<V>>,
    pub disabled_groups: bool,
    pub required: bool,
}

pub type GroupMultiSelectPrompt<V> = Prompt<Vec<V>, GroupMultiSelectState<V>>;
type GroupSession<V> = Session<Vec<V>, GroupMultiSelectState<V>>;

pub struct GroupMultiSelectParams<V> {
    pub options: PromptOptions,
    pub groups: Vec<OptionGroup<V>>,
    /// Values selected up front. When empty, pre-selected options are used.
    pub initial_value: Vec<V>,
    pub disabled_groups: bool,
    pub required: bool,
    pub validate: Option<ValidateFn<Vec<V>>>,
    pub render: Option<RenderFn<Vec<V>, GroupMultiSelectState<V>>>,
}

impl<V> Default for GroupMultiSelectParams<V> {
    fn default() -> Self {
        Self {
            options: PromptOptions::default(),
            groups: Vec::new(),
            initial_value: Vec::new(),
            disabled_groups: false,
            required: false,
            validate: None,
            render: None,
        }
    }
}

pub fn group_multi_select<V>(
    params: GroupMultiSelectParams<V>,
) -> Result<GroupMultiSelectPrompt<V>, PromptError>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    const NAME: &str = "GroupMultiSelectPrompt";
    if params.render.is_none() {
        return Err(PromptError::MissingParam {
            prompt: NAME,
            param: "render",
        });
    }
    if params.groups.is_empty() {
        return Err(PromptError::MissingParam {
            prompt: NAME,
            param: "options",
        });
    }

    let rows = flatten_groups(params.groups);
    let initial_value = if params.initial_value.is_empty() {
        rows.iter()
            .filter_map(|row| match row {
                GroupRow::Option(option) if option.selected => Some(option.value.clone()),
                _ => None,
            })
            .collect()
    } else {
        params.initial_value
    };

    let widget = GroupMultiSelectState {
        rows,
        disabled_groups: params.disabled_groups,
        required: params.required,
    };
    let cursor = first_selectable(&widget, 0, 1);

    let mut prompt = Prompt::named(
        NAME,
        PromptParams {
            options: params.options,
            initial_value,
            cursor,
            validate: wrap_validate(params.validate, params.required, REQUIRED_MESSAGE),
            render: params.render,
            widget,
        },
    )?;

    let mut handler = ActionHandler::new()
        .on(Action::Up, |s: &mut GroupSession<V>| move_cursor(s, -1))
        .on(Action::Down, |s: &mut GroupSession<V>| move_cursor(s, 1))
        .on(Action::Left, |s: &mut GroupSession<V>| move_cursor(s, -1))
        .on(Action::Right, |s: &mut GroupSession<V>| move_cursor(s, 1))
        .on(Action::Home, |s: &mut GroupSession<V>| {
            s.cursor = first_selectable(&s.widget, 0, 1)
        })
        .on(Action::End, |s: &mut GroupSession<V>| {
            let last = s.widget.rows.len().saturating_sub(1);
            s.cursor = first_selectable(&s.widget, last, -1)
        })
        .on(Action::Space, toggle_row);

    prompt.on(EventKind::Key, move |s, signal| {
        if let Signal::Key(key) = signal {
            let action = s.resolve(key);
            handler.dispatch(action, s, key);
        }
    });
    Ok(prompt)
}

fn flatten_groups<V: Clone>(groups: Vec<OptionGroup<V>>) -> Vec<GroupRow<V>> {
    let mut rows = Vec::new();
    for group in groups {
        rows.push(GroupRow::Group {
            label: group.label,
            members: group.options.iter().map(|o| o.value.clone()).collect(),
        });
        rows.extend(group.options.into_iter().map(GroupRow::Option));
    }
    rows
}

fn is_selectable<V>(widget: &GroupMultiSelectState<V>, index: usize) -> bool {
    !widget.disabled_groups || widget.rows.get(index).is_some_and(|row| !row.is_group())
}

/// `from` itself if the cursor may rest there, otherwise the next row in
/// `step` direction that it may. Stays at `from` when no row qualifies.
fn first_selectable<V>(widget: &GroupMultiSelectState<V>, from: usize, step: isize) -> usize {
    let len = widget.rows.len();
    let mut index = from;
    for _ in 0..len {
        if is_selectable(widget, index) {
            return index;
        }
        index = wrap_index(index as isize + step, len);
    }
    from
}

fn move_cursor<V>(s: &mut GroupSession<V>, step: isize) {
    let len = s.widget.rows.len();
    let next = wrap_index(s.cursor as isize + step, len);
    s.cursor = first_selectable(&s.widget, next, step);
}

fn toggle_row<V: Clone + PartialEq>(s: &mut GroupSession<V>) {
    let selected_group = s.is_group_selected(s.cursor);
    match s.widget.rows.get(s.cursor) {
        Some(GroupRow::Group { .. }) if s.widget.disabled_groups => {}
        Some(GroupRow::Group { members, .. }) if selected_group => {
            s.value.retain(|v| !members.contains(v));
        }
        Some(GroupRow::Group { members, .. }) => {
            for member in members {
                if !s.value.contains(member) {
                    s.value.push(member.clone());
                }
            }
        }
        Some(GroupRow::Option(option)) => match s.value.iter().position(|v| v == &option.value) {
            Some(i) => {
                s.value.remove(i);
            }
            None => s.value.push(option.value.clone()),
        },
        None => {}
    }
}

impl<V: PartialEq> Session<Vec<V>, GroupMultiSelectState<V>> {
    pub fn is_selected(&self, value: &V) -> bool {
        self.value.contains(value)
    }

    /// True when row `index` is a group header and every option in it is
    /// selected. Always false with disabled groups.
    pub fn is_group_selected(&self, index: usize) -> bool {
        if self.widget.disabled_groups {
            return false;
        }
        match self.widget.rows.get(index) {
            Some(GroupRow::Group { members, .. }) => {
                !members.is_empty() && members.iter().all(|m| self.value.contains(m))
            }
            _ => false,
        }
    }

    pub fn highlighted(&self) -> Option<&GroupRow<V>> {
        self.widget.rows.get(self.cursor)
    }
}
