//! # Terminal adapter
//!
//! Everything that touches the terminal or the clock: raw mode, the input
//! reader threads and key decoder, the in-place frame renderer, validation
//! timing, cancellation, and the prompt run loop that ties them together.
//!
//! ```text
//!   stdin / reader ─▶ input (bytes) ─▶ KeyDecoder ─▶ Prompt::press_key
//!                                                      │
//!   CancellationToken ─▶ waiter ─▶ restore + Cancel ───┤
//!                                                      ▼
//!                          Validator ◀── submit    FrameRenderer ─▶ output
//! ```
//!
//! `core` owns the data (keys, actions, events, session state); this layer
//! owns the side effects. Widgets in `components` are thin configurations
//! of `Prompt` on top of both.

pub mod cancel;
pub mod components;
pub mod input;
pub mod prompt;
pub mod render;
pub mod terminal;
pub mod validate;

pub use cancel::{CancellationHandle, CancellationToken};
pub use input::{InputHub, InputSource};
pub use prompt::{Prompt, PromptError, PromptOptions, PromptParams, RenderFn};
pub use terminal::{CrosstermTerminal, DetachedTerminal, TerminalMode};
pub use validate::ValidateFn;
