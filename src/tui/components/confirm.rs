//! Yes / no question. Any arrow key flips the answer.

use crate::core::action::{Action, ActionHandler};
use crate::core::events::{EventKind, Signal};
use crate::core::state::Session;
use crate::core::text::wrap_index;
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};

#[derive(Debug, Clone)]
pub struct ConfirmState {
    pub active: String,
    pub inactive: String,
}

pub type ConfirmPrompt = Prompt<bool, ConfirmState>;

#[derive(Default)]
pub struct ConfirmParams {
    pub options: PromptOptions,
    pub initial_value: bool,
    /// Label for `true`; "yes" when empty.
    pub active: String,
    /// Label for `false`; "no" when empty.
    pub inactive: String,
    pub render: Option<RenderFn<bool, ConfirmState>>,
}

fn toggle(s: &mut Session<bool, ConfirmState>) {
    s.value = !s.value;
    s.cursor = wrap_index(s.cursor as isize + 1, 2);
}

pub fn confirm(params: ConfirmParams) -> Result<ConfirmPrompt, PromptError> {
    let label = |given: String, fallback: &str| {
        if given.is_empty() {
            fallback.to_string()
        } else {
            given
        }
    };

    let mut prompt = Prompt::named(
        "ConfirmPrompt",
        PromptParams {
            options: params.options,
            initial_value: params.initial_value,
            cursor: 0,
            validate: None,
            render: params.render,
            widget: ConfirmState {
                active: label(params.active, "yes"),
                inactive: label(params.inactive, "no"),
            },
        },
    )?;

    let mut handler = ActionHandler::new()
        .on(Action::Up, toggle)
        .on(Action::Down, toggle)
        .on(Action::Left, toggle)
        .on(Action::Right, toggle);
    prompt.on(EventKind::Key, move |s, signal| {
        if let Signal::Key(key) = signal {
            let action = s.resolve(key);
            handler.dispatch(action, s, key);
        }
    });
    Ok(prompt)
}

impl Session<bool, ConfirmState> {
    /// Label of the current answer.
    pub fn label(&self) -> &str {
        if self.value {
            &self.widget.active
        } else {
            &self.widget.inactive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::{Key, KeyName};
    use crate::core::state::PromptState;
    use crate::test_support::{SharedBuffer, test_options};

    fn build(initial_value: bool) -> ConfirmPrompt {
        confirm(ConfirmParams {
            options: test_options(b"", &SharedBuffer::default()).0,
            initial_value,
            render: Some(Box::new(|s: &Session<bool, ConfirmState>| s.label().to_string())),
            ..ConfirmParams::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_labels() {
        let prompt = build(true);
        assert_eq!(prompt.session().widget.active, "yes");
        assert_eq!(prompt.session().widget.inactive, "no");
        assert_eq!(prompt.session().label(), "yes");
    }

    #[test]
    fn test_arrows_toggle_value_and_cursor() {
        let mut prompt = build(false);
        prompt.press_key(&Key::named(KeyName::Up)).unwrap();
        assert!(prompt.session().value);
        assert_eq!(prompt.session().cursor, 1);

        prompt.press_key(&Key::named(KeyName::Right)).unwrap();
        assert!(!prompt.session().value);
        assert_eq!(prompt.session().cursor, 0);
        assert_eq!(prompt.frame(), Some("no"));
    }

    #[test]
    fn test_other_keys_do_nothing() {
        let mut prompt = build(true);
        prompt.press_key(&Key::char('n')).unwrap();
        prompt.press_key(&Key::named(KeyName::Space)).unwrap();
        assert!(prompt.session().value);
        assert_eq!(prompt.state(), PromptState::Active);
    }

    #[test]
    fn test_submit_returns_value() {
        let output = SharedBuffer::default();
        let (options, _) = test_options(b"\x1b[B\r", &output);
        let prompt = confirm(ConfirmParams {
            options,
            initial_value: true,
            render: Some(Box::new(|s: &Session<bool, ConfirmState>| s.label().to_string())),
            ..ConfirmParams::default()
        })
        .unwrap();
        assert!(!prompt.run().unwrap());
    }
}
