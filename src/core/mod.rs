//! # Prompt Engine Core
//!
//! Everything a prompt needs that does not touch a terminal: the key
//! alphabet, alias resolution, lifecycle events, session state, text helpers
//! and configuration.
//!
//! ```text
//!   bytes ──▶ (tui::input) ──▶ Key ──▶ EventBus(Key) ──▶ ActionHandler
//!                                                           │
//!                                   Session { value, cursor, widget } ◀─┘
//!                                           │
//!                         state transition  ▼
//!                     Finalize ─▶ render ─▶ Submit / Cancel
//! ```
//!
//! ## Modules
//!
//! - [`key`]: `Key` and `KeyName`, the decoded keystroke
//! - [`action`]: `Action`, the alias table and per-widget `ActionHandler`
//! - [`events`]: `EventBus` with durable and one-shot listeners
//! - [`state`]: `PromptState` lifecycle and the `Session` data
//! - [`text`]: line splitting, value editing, frame building
//! - [`config`]: `~/.promptkit/config.toml` and env overrides

pub mod action;
pub mod config;
pub mod events;
pub mod key;
pub mod state;
pub mod text;
