//! Promptkit library exports
//!
//! Interactive terminal prompts: a pure `core` (keys, actions, events,
//! session state, configuration) and a `tui` adapter that runs prompts
//! against a real or simulated terminal.

pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;

pub use crate::core::key::{Key, KeyName};
pub use crate::core::state::{PromptState, Session};
pub use crate::tui::{CancellationToken, Prompt, PromptError, PromptOptions};
