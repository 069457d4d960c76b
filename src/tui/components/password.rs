//! Masked text entry. The value is edited like a text prompt but rendered
//! through the masking helpers, one `*` per character.

use crate::core::events::{EventKind, Signal};
use crate::core::state::Session;
use crate::core::text::edit_value;
use crate::tui::prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};
use crate::tui::validate::ValidateFn;

use super::{cursor_view, wrap_validate};

const REQUIRED_MESSAGE: &str = "Password is required! Please enter a value.";
const MASK: char = '*';

#[derive(Debug, Clone, Default)]
pub struct PasswordState {
    pub required: bool,
}

pub type PasswordPrompt = Prompt<String, PasswordState>;

#[derive(Default)]
pub struct PasswordParams {
    pub options: PromptOptions,
    pub initial_value: String,
    pub required: bool,
    pub validate: Option<ValidateFn<String>>,
    pub render: Option<RenderFn<String, PasswordState>>,
}

pub fn password(params: PasswordParams) -> Result<PasswordPrompt, PromptError> {
    let cursor = params.initial_value.len();
    let mut prompt = Prompt::named(
        "PasswordPrompt",
        PromptParams {
            options: params.options,
            initial_value: params.initial_value,
            cursor,
            validate: wrap_validate(params.validate, params.required, REQUIRED_MESSAGE),
            render: params.render,
            widget: PasswordState {
                required: params.required,
            },
        },
    )?;

    prompt.on(EventKind::Key, |s, signal| {
        if let Signal::Key(key) = signal {
            let (value, cursor) = edit_value(key, &s.value, s.cursor);
            s.value = value;
            s.cursor = cursor;
        }
    });
    Ok(prompt)
}

impl Session<String, PasswordState> {
    pub fn masked(&self) -> String {
        MASK.to_string().repeat(self.value.chars().count())
    }

    /// Masked value with the cursor drawn in.
    pub fn masked_with_cursor(&self) -> String {
        let before = self.value[..self.cursor.min(self.value.len())].chars().count();
        // One byte per mask char, so the char index is the byte index
        cursor_view(&self.masked(), before)
    }
}
