//! # Widgets
//!
//! Ready-made prompts built on `Prompt<T, W>`. Each widget is a constructor
//! that takes a params struct and returns a configured prompt whose `W`
//! carries the widget's own state (options, filter text, labels).
//!
//! ```text
//! components/
//! ├── mod.rs           shared option types, required-check wrapper, filtering
//! ├── text.rs          free text with placeholder
//! ├── password.rs      masked free text
//! ├── confirm.rs       yes / no toggle
//! ├── select.rs        one of many, optional filter
//! ├── multi_select.rs  any of many, optional filter
//! ├── group_multi_select.rs  any of many, listed under group headers
//! └── select_key.rs    one of many, picked by a single key press
//! ```
//!
//! Every widget wires its key handling the same way: a Key listener resolves
//! the key through the session's alias table and hands the action to an
//! `ActionHandler`. Unbound keys reach the widget's fallback (text entry,
//! filter capture). Submit and Cancel are left to the prompt itself.
//!
//! Render callbacks are mandatory; a widget built without one fails with
//! `PromptError::MissingParam`.

pub mod confirm;
pub mod group_multi_select;
pub mod multi_select;
pub mod password;
pub mod select;
pub mod select_key;
pub mod text;

use crossterm::style::Stylize;

use super::validate::ValidateFn;
use crate::core::text::next_char_boundary;

pub use confirm::{ConfirmParams, ConfirmPrompt, ConfirmState, confirm};
pub use group_multi_select::{
    GroupMultiSelectParams, GroupMultiSelectPrompt, GroupMultiSelectState, GroupRow, OptionGroup,
    group_multi_select,
};
pub use multi_select::{
    MultiSelectOption, MultiSelectParams, MultiSelectPrompt, MultiSelectState, multi_select,
};
pub use password::{PasswordParams, PasswordPrompt, PasswordState, password};
pub use select::{SelectParams, SelectPrompt, SelectState, select};
pub use select_key::{KeyOption, SelectKeyParams, SelectKeyPrompt, SelectKeyState, select_key};
pub use text::{TextParams, TextPrompt, TextState, text};

// ============================================================================
// Options
// ============================================================================

/// One entry of a select prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption<V> {
    pub label: String,
    pub value: V,
}

impl<V> SelectOption<V> {
    pub fn new(value: V, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Options whose value is a string use their label when the value is empty.
pub fn fill_empty_values(options: &mut [SelectOption<String>]) {
    for option in options.iter_mut().filter(|o| o.value.is_empty()) {
        option.value = option.label.clone();
    }
}

/// Options whose label matches `search`, case-insensitively, and the index
/// of the first kept option for which `is_current` holds (0 if none).
///
/// An empty search keeps every option.
pub(crate) fn filter_by_label<O: Clone>(
    all: &[O],
    search: &str,
    label: impl Fn(&O) -> &str,
    is_current: impl Fn(&O) -> bool,
) -> (Vec<O>, usize) {
    let needle = search.to_lowercase();
    let kept: Vec<O> = all
        .iter()
        .filter(|o| needle.is_empty() || label(o).to_lowercase().contains(&needle))
        .cloned()
        .collect();
    let cursor = kept.iter().position(is_current).unwrap_or(0);
    (kept, cursor)
}

// ============================================================================
// Validation
// ============================================================================

/// Values a required check can reject.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<V> Blank for Vec<V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<V> Blank for Option<V> {
    fn is_blank(&self) -> bool {
        self.is_none()
    }
}

impl Blank for bool {
    fn is_blank(&self) -> bool {
        false
    }
}

/// Compose a user check with a required check.
///
/// The user check runs first and its message wins. A blank value then fails
/// with `message` when `required` is set. Returns `None` when there is
/// nothing to check, so the prompt submits without a validation pass.
pub fn wrap_validate<T>(
    validate: Option<ValidateFn<T>>,
    required: bool,
    message: &'static str,
) -> Option<ValidateFn<T>>
where
    T: Blank + 'static,
{
    if validate.is_none() && !required {
        return None;
    }
    Some(Box::new(move |value: &T| {
        if let Some(check) = validate.as_ref() {
            check(value)?;
        }
        if required && value.is_blank() {
            return Err(message.to_string());
        }
        Ok(())
    }))
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// `text` with the character at byte `cursor` shown in inverse video, or a
/// block cursor appended when `cursor` is at the end.
pub(crate) fn cursor_view(text: &str, cursor: usize) -> String {
    let cursor = cursor.min(text.len());
    if cursor == text.len() || !text.is_char_boundary(cursor) {
        return format!("{text}█");
    }
    let next = next_char_boundary(text, cursor);
    format!(
        "{}{}{}",
        &text[..cursor],
        text[cursor..next].to_string().reverse(),
        &text[next..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_empty_values_uses_label() {
        let mut options = vec![
            SelectOption::new(String::new(), "Rust"),
            SelectOption::new("go".to_string(), "Go"),
        ];
        fill_empty_values(&mut options);
        assert_eq!(options[0].value, "Rust");
        assert_eq!(options[1].value, "go");
    }

    #[test]
    fn test_filter_by_label_is_case_insensitive() {
        let all = vec![
            SelectOption::new(1, "Apple"),
            SelectOption::new(2, "banana"),
            SelectOption::new(3, "Pineapple"),
        ];
        let (kept, cursor) = filter_by_label(&all, "APP", |o| o.label.as_str(), |o| o.value == 3);
        assert_eq!(kept.iter().map(|o| o.value).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(cursor, 1);

        let (kept, cursor) = filter_by_label(&all, "", |o| o.label.as_str(), |o| o.value == 2);
        assert_eq!(kept.len(), 3);
        assert_eq!(cursor, 1);

        let (kept, cursor) = filter_by_label(&all, "kiwi", |o| o.label.as_str(), |_| true);
        assert!(kept.is_empty());
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_wrap_validate_without_checks_is_none() {
        assert!(wrap_validate::<String>(None, false, "required").is_none());
    }

    #[test]
    fn test_wrap_validate_user_check_runs_first() {
        let check = wrap_validate::<String>(
            Some(Box::new(|_: &String| -> Result<(), String> {
                Err("custom".to_string())
            })),
            true,
            "required",
        )
        .unwrap();
        assert_eq!(check(&String::new()), Err("custom".to_string()));
    }

    #[test]
    fn test_wrap_validate_required_rejects_blank() {
        let check = wrap_validate::<Vec<u8>>(None, true, "pick one").unwrap();
        assert_eq!(check(&vec![]), Err("pick one".to_string()));
        assert_eq!(check(&vec![1]), Ok(()));

        let check = wrap_validate::<Option<u8>>(None, true, "pick one").unwrap();
        assert!(check(&None).is_err());
        assert!(check(&Some(0)).is_ok());
    }

    #[test]
    fn test_cursor_view() {
        assert_eq!(cursor_view("abc", 3), "abc█");
        assert_eq!(cursor_view("", 0), "█");

        let middle = cursor_view("abc", 1);
        assert!(middle.starts_with('a'));
        assert!(middle.ends_with('c'));
        assert!(middle.contains("\x1b[7m"));
        assert!(!middle.contains('█'));
    }
}
