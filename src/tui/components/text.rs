//! Free text entry.
//!
//! Editing happens at a byte cursor that starts at the end of the initial
//! value. Tab on an empty value takes the placeholder.

use crate::core::events::{EventKind, Signal};
use crate::core::key::KeyName;
use crate::core::state::Session;
use crate::core::text::edit_value;
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};
use crate::tui::validate::ValidateFn;

use super::{cursor_view, wrap_validate};

const REQUIRED_MESSAGE: &str = "Value is required! Please enter a value.";

#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub placeholder: String,
    pub required: bool,
}

pub type TextPrompt = Prompt<String, TextState>;

#[derive(Default)]
pub struct TextParams {
    pub options: PromptOptions,
    pub initial_value: String,
    pub placeholder: String,
    pub required: bool,
    pub validate: Option<ValidateFn<String>>,
    pub render: Option<RenderFn<String, TextState>>,
}

pub fn text(params: TextParams) -> Result<TextPrompt, PromptError> {
    let cursor = params.initial_value.len();
    let mut prompt = Prompt::named(
        "TextPrompt",
        PromptParams {
            options: params.options,
            initial_value: params.initial_value,
            cursor,
            validate: wrap_validate(params.validate, params.required, REQUIRED_MESSAGE),
            render: params.render,
            widget: TextState {
                placeholder: params.placeholder,
                required: params.required,
            },
        },
    )?;

    prompt.on(EventKind::Key, |s, signal| {
        if let Signal::Key(key) = signal {
            if key.name == KeyName::Tab && s.value.is_empty() && !s.widget.placeholder.is_empty() {
                s.value = s.widget.placeholder.clone();
                s.cursor = s.value.len();
                return;
            }
            let (value, cursor) = edit_value(key, &s.value, s.cursor);
            s.value = value;
            s.cursor = cursor;
        }
    });
    Ok(prompt)
}

impl Session<String, TextState> {
    /// The value with the cursor drawn in: the character under it in inverse
    /// video, or `█` at the end.
    pub fn value_with_cursor(&self) -> String {
        cursor_view(&self.value, self.cursor)
    }
}
