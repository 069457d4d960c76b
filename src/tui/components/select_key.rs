//! Pick an option by pressing its key. The first matching key submits
//! straight away; Enter submits only when an option is bound to it.

use crate::core::action::global_aliases;
use crate::core::events::{EventKind, Signal};
use crate::core::key::KeyName;
use crate::core::state::{PromptState, Session};
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};

#[derive(Debug, Clone, PartialEq)]
pub struct KeyOption<V> {
    pub key: KeyName,
    pub label: String,
    pub value: V,
}

impl<V> KeyOption<V> {
    pub fn new(key: KeyName, value: V, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            value,
        }
    }
}

/// String options without a value take their key's name.
pub fn fill_empty_key_values(options: &mut [KeyOption<String>]) {
    for option in options.iter_mut().filter(|o| o.value.is_empty()) {
        option.value = option.key.to_string();
    }
}

#[derive(Debug, Clone)]
pub struct SelectKeyState<V> {
    pub options: Vec<KeyOption<V>>,
}

pub type SelectKeyPrompt<V> = Prompt<Option<V>, SelectKeyState<V>>;

pub struct SelectKeyParams<V> {
    pub options: PromptOptions,
    pub choices: Vec<KeyOption<V>>,
    pub render: Option<RenderFn<Option<V>, SelectKeyState<V>>>,
}

impl<V> Default for SelectKeyParams<V> {
    fn default() -> Self {
        Self {
            options: PromptOptions::default(),
            choices: Vec::new(),
            render: None,
        }
    }
}

pub fn select_key<V>(params: SelectKeyParams<V>) -> Result<SelectKeyPrompt<V>, PromptError>
where
    V: Clone + Send + Sync + 'static,
{
    const NAME: &str = "SelectKeyPrompt";
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

    let mut options = params.options;
    let mut aliases = options.aliases.take().unwrap_or_else(global_aliases);
    aliases.unbind(&KeyName::Enter);
    options.aliases = Some(aliases);

    let mut prompt = Prompt::named(
        NAME,
        PromptParams {
            options,
            initial_value: None,
            cursor: 0,
            validate: None,
            render: params.render,
            widget: SelectKeyState {
                options: params.choices,
            },
        },
    )?;

    prompt.on(EventKind::Key, |s, signal| {
        if let Signal::Key(key) = signal
            && let Some(i) = s.widget.options.iter().position(|o| o.key == key.name)
        {
            s.value = Some(s.widget.options[i].value.clone());
            s.cursor = i;
            s.state = PromptState::Submit;
        }
    });
    Ok(prompt)
}

impl<V> Session<Option<V>, SelectKeyState<V>> {
    /// The option picked on submit.
    pub fn chosen(&self) -> Option<&KeyOption<V>> {
        self.value.as_ref().and_then(|_| self.widget.options.get(self.cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::Key;
    use crate::test_support::{SharedBuffer, test_options};

    type KeySession = Session<Option<String>, SelectKeyState<String>>;

    fn build(choices: Vec<KeyOption<String>>) -> SelectKeyPrompt<String> {
        select_key(SelectKeyParams {
            options: test_options(b"", &SharedBuffer::default()).0,
            choices,
            render: Some(Box::new(|s: &KeySession| format!("{:?}", s.value))),
        })
        .unwrap()
    }

    #[test]
    fn test_requires_options() {
        let result = select_key::<String>(SelectKeyParams {
            render: Some(Box::new(|_: &KeySession| String::new())),
            ..SelectKeyParams::default()
        });
        assert!(matches!(
            result,
            Err(PromptError::MissingParam { param: "options", .. })
        ));
    }

    #[test]
    fn test_matching_key_submits() {
        let mut prompt = build(vec![
            KeyOption::new(KeyName::Char('a'), "a".to_string(), "Add"),
            KeyOption::new(KeyName::Enter, "enter".to_string(), "Confirm"),
        ]);
        prompt.press_key(&Key::char('x')).unwrap();
        assert_eq!(prompt.state(), PromptState::Active);
        assert_eq!(prompt.session().value, None);

        prompt.press_key(&Key::named(KeyName::Enter)).unwrap();
        assert_eq!(prompt.state(), PromptState::Submit);
        assert_eq!(prompt.session().value.as_deref(), Some("enter"));
        assert_eq!(prompt.session().chosen().map(|o| o.label.as_str()), Some("Confirm"));
    }

    #[test]
    fn test_enter_without_option_does_not_submit() {
        let mut prompt = build(vec![KeyOption::new(KeyName::Char('a'), "a".to_string(), "")]);
        prompt.press_key(&Key::named(KeyName::Enter)).unwrap();
        assert_eq!(prompt.state(), PromptState::Active);

        prompt.press_key(&Key::char('a')).unwrap();
        assert_eq!(prompt.state(), PromptState::Submit);
        assert_eq!(prompt.session().value.as_deref(), Some("a"));
    }

    #[test]
    fn test_escape_still_cancels() {
        let mut prompt = build(vec![KeyOption::new(KeyName::Char('y'), "y".to_string(), "")]);
        prompt.press_key(&Key::named(KeyName::Escape)).unwrap();
        assert_eq!(prompt.state(), PromptState::Cancel);
    }

    #[test]
    fn test_key_names_fill_empty_values() {
        let mut options = vec![
            KeyOption::new(KeyName::Char('b'), String::new(), "bar"),
            KeyOption::new(KeyName::Char('c'), "custom".to_string(), "baz"),
        ];
        fill_empty_key_values(&mut options);
        assert_eq!(options[0].value, "b");
        assert_eq!(options[1].value, "custom");
    }
}
