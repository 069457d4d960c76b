//! # Select
//!
//! One option out of a list. The value always follows the highlighted
//! option; navigation wraps around at both ends.
//!
//! With filtering enabled, keys without a binding edit a search string and
//! only options whose label contains it (ignoring case) stay visible. The
//! highlight stays on the current value when it survives the filter and
//! falls back to the first visible option otherwise. When nothing matches,
//! the value is `None`.

use crate::core::action::{Action, ActionHandler};
use crate::core::events::{EventKind, Signal};
use crate::core::key::Key;
use crate::core::state::Session;
use crate::core::text::{edit_value, wrap_index};
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};

use super::{SelectOption, filter_by_label, wrap_validate};

const REQUIRED_MESSAGE: &str = "Please select an option.";

#[derive(Debug, Clone)]
pub struct SelectState<V> {
    /// Options currently visible, after filtering.
    pub options: Vec<SelectOption<V>>,
    pub all_options: Vec<SelectOption<V>>,
    pub filter: bool,
    pub search: String,
    pub required: bool,
}

pub type SelectPrompt<V> = Prompt<Option<V>, SelectState<V>>;
type SelectSession<V> = Session<Option<V>, SelectState<V>>;

pub struct SelectParams<V> {
    pub options: PromptOptions,
    pub choices: Vec<SelectOption<V>>,
    /// The option highlighted first; the first option when absent or unknown.
    pub initial_value: Option<V>,
    pub filter: bool,
    pub required: bool,
    pub render: Option<RenderFn<Option<V>, SelectState<V>>>,
}

impl<V> Default for SelectParams<V> {
    fn default() -> Self {
        Self {
            options: PromptOptions::default(),
            choices: Vec::new(),
            initial_value: None,
            filter: false,
            required: false,
            render: None,
        }
    }
}

pub fn select<V>(params: SelectParams<V>) -> Result<SelectPrompt<V>, PromptError>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    const NAME: &str = "SelectPrompt";
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

    let start = params
        .initial_value
        .as_ref()
        .and_then(|initial| params.choices.iter().position(|o| &o.value == initial))
        .unwrap_or(0);
    let initial_value = params.choices.get(start).map(|o| o.value.clone());

    let mut prompt = Prompt::named(
        NAME,
        PromptParams {
            options: params.options,
            initial_value,
            cursor: start,
            validate: wrap_validate(None, params.required, REQUIRED_MESSAGE),
            render: params.render,
            widget: SelectState {
                options: params.choices.clone(),
                all_options: params.choices,
                filter: params.filter,
                search: String::new(),
                required: params.required,
            },
        },
    )?;

    let mut handler = ActionHandler::new()
        .on(Action::Up, |s: &mut SelectSession<V>| move_cursor(s, -1))
        .on(Action::Down, |s: &mut SelectSession<V>| move_cursor(s, 1))
        .on(Action::Left, |s: &mut SelectSession<V>| move_cursor(s, -1))
        .on(Action::Right, |s: &mut SelectSession<V>| move_cursor(s, 1))
        .on(Action::Home, |s: &mut SelectSession<V>| s.cursor = 0)
        .on(Action::End, |s: &mut SelectSession<V>| {
            s.cursor = s.widget.options.len().saturating_sub(1)
        })
        .fallback(filter_options);

    prompt.on(EventKind::Key, move |s, signal| {
        if let Signal::Key(key) = signal {
            let action = s.resolve(key);
            handler.dispatch(action, s, key);
            s.value = s.widget.options.get(s.cursor).map(|o| o.value.clone());
        }
    });
    Ok(prompt)
}

fn move_cursor<V>(s: &mut SelectSession<V>, step: isize) {
    s.cursor = wrap_index(s.cursor as isize + step, s.widget.options.len());
}

fn filter_options<V: Clone + PartialEq>(s: &mut SelectSession<V>, key: &Key) {
    if !s.widget.filter {
        return;
    }
    let search = &s.widget.search;
    let (search, _) = edit_value(key, search, search.len());
    let current = s.value.as_ref();
    let (visible, cursor) = filter_by_label(
        &s.widget.all_options,
        &search,
        |o| o.label.as_str(),
        |o| Some(&o.value) == current,
    );
    s.widget.search = search;
    s.widget.options = visible;
    s.cursor = cursor;
}

impl<V> Session<Option<V>, SelectState<V>> {
    /// The highlighted option, if any is visible.
    pub fn highlighted(&self) -> Option<&SelectOption<V>> {
        self.widget.options.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::KeyName;
    use crate::core::state::PromptState;
    use crate::test_support::{SharedBuffer, test_options};

    fn fruits() -> Vec<SelectOption<&'static str>> {
        vec![
            SelectOption::new("apple", "Apple"),
            SelectOption::new("banana", "Banana"),
            SelectOption::new("cherry", "Cherry"),
        ]
    }

    fn build(filter: bool, initial_value: Option<&'static str>) -> SelectPrompt<&'static str> {
        select(SelectParams {
            options: test_options(b"", &SharedBuffer::default()).0,
            choices: fruits(),
            initial_value,
            filter,
            render: Some(Box::new(|s: &SelectSession<&'static str>| {
                s.highlighted().map(|o| o.label.clone()).unwrap_or_default()
            })),
            ..SelectParams::default()
        })
        .unwrap()
    }

    #[test]
    fn test_requires_options() {
        let result = select::<u8>(SelectParams {
            render: Some(Box::new(|_: &SelectSession<u8>| String::new())),
            ..SelectParams::default()
        });
        assert!(matches!(
            result,
            Err(PromptError::MissingParam { param: "options", .. })
        ));
    }

    #[test]
    fn test_starts_on_initial_value() {
        let prompt = build(false, Some("cherry"));
        assert_eq!(prompt.session().cursor, 2);
        assert_eq!(prompt.session().value, Some("cherry"));

        let prompt = build(false, Some("kiwi"));
        assert_eq!(prompt.session().cursor, 0);
        assert_eq!(prompt.session().value, Some("apple"));
    }

    #[test]
    fn test_navigation_wraps_and_value_follows() {
        let mut prompt = build(false, None);
        prompt.press_key(&Key::named(KeyName::Up)).unwrap();
        assert_eq!(prompt.session().cursor, 2);
        assert_eq!(prompt.session().value, Some("cherry"));

        prompt.press_key(&Key::named(KeyName::Down)).unwrap();
        assert_eq!(prompt.session().value, Some("apple"));

        prompt.press_key(&Key::named(KeyName::End)).unwrap();
        assert_eq!(prompt.session().value, Some("cherry"));
        prompt.press_key(&Key::named(KeyName::Home)).unwrap();
        assert_eq!(prompt.session().value, Some("apple"));
        assert_eq!(prompt.frame(), Some("Apple"));
    }

    #[test]
    fn test_typing_without_filter_is_ignored() {
        let mut prompt = build(false, Some("banana"));
        prompt.press_key(&Key::char('c')).unwrap();
        assert_eq!(prompt.session().widget.search, "");
        assert_eq!(prompt.session().widget.options.len(), 3);
        assert_eq!(prompt.session().value, Some("banana"));
    }

    #[test]
    fn test_filter_narrows_and_keeps_current_value() {
        let mut prompt = build(true, Some("banana"));
        prompt.press_key(&Key::char('A')).unwrap();
        // "a" matches Apple and Banana; banana stays highlighted
        assert_eq!(prompt.session().widget.options.len(), 2);
        assert_eq!(prompt.session().cursor, 1);
        assert_eq!(prompt.session().value, Some("banana"));

        prompt.press_key(&Key::char('p')).unwrap();
        assert_eq!(prompt.session().widget.search, "Ap");
        assert_eq!(prompt.session().value, Some("apple"));
    }

    #[test]
    fn test_filter_without_match_clears_value() {
        let mut prompt = build(true, None);
        prompt.press_key(&Key::char('z')).unwrap();
        assert!(prompt.session().widget.options.is_empty());
        assert_eq!(prompt.session().value, None);

        prompt.press_key(&Key::named(KeyName::Backspace)).unwrap();
        assert_eq!(prompt.session().widget.options.len(), 3);
        assert_eq!(prompt.session().cursor, 0);
        assert_eq!(prompt.session().value, Some("apple"));
    }

    #[test]
    fn test_clearing_search_restores_cursor_on_value() {
        let mut prompt = build(true, None);
        prompt.press_key(&Key::char('c')).unwrap();
        assert_eq!(prompt.session().value, Some("cherry"));
        prompt.press_key(&Key::named(KeyName::Backspace)).unwrap();
        assert_eq!(prompt.session().cursor, 2);
        assert_eq!(prompt.session().value, Some("cherry"));
    }

    #[test]
    fn test_required_rejects_empty_filter_result() {
        let mut prompt = select(SelectParams {
            options: test_options(b"", &SharedBuffer::default()).0,
            choices: fruits(),
            filter: true,
            required: true,
            render: Some(Box::new(|_: &SelectSession<&'static str>| String::new())),
            ..SelectParams::default()
        })
        .unwrap();
        prompt.press_key(&Key::char('z')).unwrap();
        prompt.press_key(&Key::named(KeyName::Enter)).unwrap();
        assert_eq!(prompt.state(), PromptState::Error);
        assert_eq!(prompt.session().error, REQUIRED_MESSAGE);
    }
}
