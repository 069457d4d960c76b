//! # Prompt
//!
//! The state machine and run loop shared by every widget.
//!
//! ## Key flow
//!
//! ```text
//!   Key ─▶ Initial/Error → Active
//!       ─▶ emit Key (widget handler edits value/cursor)
//!       ─▶ resolve: Submit → validate → Submit | Error(msg)
//!                   Cancel → Cancel
//!       ─▶ terminal? emit Finalize
//!       ─▶ render
//!       ─▶ terminal? emit Submit | Cancel
//! ```
//!
//! ## Run
//!
//! `run` takes raw mode for its whole duration, paints the first frame and
//! then blocks on the key decoder. An optional cancellation token is watched
//! by a waiter thread; when it fires, the waiter restores the terminal first
//! and then injects a Cancel into the input channel, so the prompt finishes
//! through the same Finalize → render → Cancel path as a user cancel.

use std::fmt;
use std::io::{self, Write};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::oneshot;

use crate::core::action::{Action, AliasTable, global_aliases};
use crate::core::config::{Timing, default_timing};
use crate::core::events::{EventBus, EventKind, ListenerId, Signal};
use crate::core::key::{Key, KeyName};
use crate::core::state::{PromptState, Session};

use super::cancel::CancellationToken;
use super::input::{InputEvent, InputMessage, InputSource, KeyDecoder};
use super::render::FrameRenderer;
use super::terminal::{
    CrosstermTerminal, DetachedTerminal, RawModeGuard, SharedTerminal, TerminalMode,
    restore_shared, shared,
};
use super::validate::{ValidateFn, Validator};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum PromptError {
    /// The user pressed a cancel key or the cancellation token fired.
    Cancelled,
    /// A widget was built without something it cannot work without.
    MissingParam {
        prompt: &'static str,
        param: &'static str,
    },
    /// Input ended before the prompt reached Submit or Cancel.
    InputClosed,
    Io(io::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::Cancelled => write!(f, "prompt cancelled"),
            PromptError::MissingParam { prompt, param } => {
                write!(f, "{prompt}: missing required parameter `{param}`")
            }
            PromptError::InputClosed => write!(f, "input closed before the prompt finished"),
            PromptError::Io(e) => write!(f, "terminal I/O error: {e}"),
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PromptError {
    fn from(e: io::Error) -> Self {
        PromptError::Io(e)
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Produces the full frame for the current session state.
pub type RenderFn<T, W> = Box<dyn Fn(&Session<T, W>) -> String>;

/// I/O and environment settings common to every widget. Anything left as
/// `None` falls back to the process-wide default.
#[derive(Default)]
pub struct PromptOptions {
    pub input: InputSource,
    /// Defaults to standard output.
    pub output: Option<Box<dyn Write + Send>>,
    /// Defaults to crossterm raw mode for an interactive stdin, a no-op otherwise.
    pub terminal: Option<Box<dyn TerminalMode>>,
    pub cancel: Option<CancellationToken>,
    /// Defaults to a snapshot of the global alias table.
    pub aliases: Option<AliasTable>,
    pub timing: Option<Timing>,
}

pub struct PromptParams<T, W = ()> {
    pub options: PromptOptions,
    pub initial_value: T,
    /// Initial cursor, interpreted by the widget.
    pub cursor: usize,
    pub validate: Option<ValidateFn<T>>,
    /// Mandatory; `Prompt::new` fails without it.
    pub render: Option<RenderFn<T, W>>,
    pub widget: W,
}

impl<T: Default, W: Default> Default for PromptParams<T, W> {
    fn default() -> Self {
        Self {
            options: PromptOptions::default(),
            initial_value: T::default(),
            cursor: 0,
            validate: None,
            render: None,
            widget: W::default(),
        }
    }
}

// ============================================================================
// Prompt
// ============================================================================

pub struct Prompt<T, W = ()> {
    name: &'static str,
    session: Session<T, W>,
    events: EventBus<Session<T, W>>,
    render_fn: RenderFn<T, W>,
    validator: Validator<T>,
    renderer: FrameRenderer,
    input: Option<InputSource>,
    terminal: SharedTerminal,
    cancel: Option<CancellationToken>,
    escape_timeout: Duration,
}

impl<T: Clone + Sync, W> Prompt<T, W> {
    pub fn new(params: PromptParams<T, W>) -> Result<Self, PromptError> {
        Self::named("Prompt", params)
    }

    /// Build a prompt, naming it in errors and logs.
    pub fn named(name: &'static str, params: PromptParams<T, W>) -> Result<Self, PromptError> {
        let PromptParams {
            options,
            initial_value,
            cursor,
            validate,
            render,
            widget,
        } = params;

        let render_fn = render.ok_or(PromptError::MissingParam {
            prompt: name,
            param: "render",
        })?;

        let timing = options.timing.unwrap_or_else(default_timing);
        let aliases = options.aliases.unwrap_or_else(global_aliases);
        let terminal = options.terminal.unwrap_or_else(|| {
            if options.input.is_interactive() {
                Box::new(CrosstermTerminal::default()) as Box<dyn TerminalMode>
            } else {
                Box::new(DetachedTerminal)
            }
        });
        let output = options
            .output
            .unwrap_or_else(|| Box::new(io::stdout()) as Box<dyn Write + Send>);

        Ok(Self {
            name,
            session: Session::new(initial_value, cursor, widget, aliases),
            events: EventBus::new(),
            render_fn,
            validator: Validator::new(validate, &timing),
            renderer: FrameRenderer::new(output),
            input: Some(options.input),
            terminal: shared(terminal),
            cancel: options.cancel,
            escape_timeout: timing.escape_timeout,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn session(&self) -> &Session<T, W> {
        &self.session
    }

    pub fn state(&self) -> PromptState {
        self.session.state
    }

    /// The frame currently on screen.
    pub fn frame(&self) -> Option<&str> {
        self.renderer.frame()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&mut Session<T, W>, &Signal<'_>) + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn once<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&mut Session<T, W>, &Signal<'_>) + 'static,
    {
        self.events.once(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Paint the current state. Returns false when nothing changed on screen.
    pub fn render(&mut self) -> io::Result<bool> {
        let frame = (self.render_fn)(&self.session);
        self.renderer.render(frame)
    }

    /// Feed one key through the state machine. Keys after Submit/Cancel are ignored.
    pub fn press_key(&mut self, key: &Key) -> io::Result<()> {
        if self.session.state.is_terminal() {
            return Ok(());
        }
        let before = self.session.state;
        if matches!(before, PromptState::Initial | PromptState::Error) {
            self.session.state = PromptState::Active;
            self.session.error.clear();
        }

        self.events.emit(&mut self.session, &Signal::Key(key));

        // A widget handler may already have decided the outcome
        let mut result = Ok(());
        if !self.session.state.is_terminal() {
            match self.session.resolve(key) {
                Action::Submit => result = self.submit(),
                Action::Cancel => self.session.state = PromptState::Cancel,
                _ => {}
            }
        }

        if self.session.state != before {
            debug!("{}: {} -> {}", self.name, before, self.session.state);
        }
        self.settle()?;
        result
    }

    fn submit(&mut self) -> io::Result<()> {
        if !self.validator.is_configured() {
            self.session.state = PromptState::Submit;
            return Ok(());
        }

        self.session.state = PromptState::Validating;
        self.session.is_validating = true;
        self.session.validation_duration = Duration::ZERO;
        self.events.emit(&mut self.session, &Signal::Validate);

        let value = self.session.value.clone();
        let session = &mut self.session;
        let renderer = &mut self.renderer;
        let render_fn = &self.render_fn;
        let mut tick_error = None;
        let outcome = self.validator.run(&value, |elapsed| {
            session.validation_duration = elapsed;
            if let Err(e) = renderer.render(render_fn(&*session)) {
                tick_error.get_or_insert(e);
            }
        });

        self.session.is_validating = false;
        match outcome {
            Ok(()) => self.session.state = PromptState::Submit,
            Err(message) => {
                info!("{}: validation rejected value: {}", self.name, message);
                self.session.state = PromptState::Error;
                self.session.error = message.clone();
                self.events.emit(&mut self.session, &Signal::Error(&message));
            }
        }
        tick_error.map_or(Ok(()), Err)
    }

    /// Finalize, repaint, then announce the outcome, for terminal states.
    /// Non-terminal states only repaint.
    fn settle(&mut self) -> io::Result<()> {
        let state = self.session.state;
        if state.is_terminal() {
            self.events.emit(&mut self.session, &Signal::Finalize);
        }
        self.render()?;
        match state {
            PromptState::Submit => {
                self.events.emit(&mut self.session, &Signal::Submit);
            }
            PromptState::Cancel => {
                self.events.emit(&mut self.session, &Signal::Cancel);
            }
            _ => {}
        }
        Ok(())
    }

    /// Run the prompt to completion.
    ///
    /// Returns the submitted value, `PromptError::Cancelled` on a user or
    /// external cancel, or `PromptError::InputClosed` if input runs out.
    /// The terminal is restored on every path.
    pub fn run(mut self) -> Result<T, PromptError> {
        let _raw_mode = RawModeGuard::acquire(self.terminal.clone())?;

        let (tx, rx) = mpsc::channel();
        let input = self.input.take().unwrap_or_default();
        let attachment = input.attach(tx.clone())?;
        let mut decoder = KeyDecoder::new(rx, self.escape_timeout);

        let waiter = match self.cancel.take() {
            Some(token) => match CancelWaiter::spawn(token, self.terminal.clone(), tx) {
                Ok(waiter) => Some(waiter),
                Err(e) => {
                    attachment.release(decoder);
                    return Err(e.into());
                }
            },
            None => None,
        };

        info!("{}: running", self.name);
        let outcome = self.event_loop(&mut decoder);
        if let Some(waiter) = waiter {
            waiter.stop();
        }
        // Typed-ahead keys belong to whichever prompt reads this source next
        attachment.release(decoder);

        match &outcome {
            Ok(()) => info!("{}: submitted", self.name),
            Err(e) => info!("{}: finished without a value: {}", self.name, e),
        }
        outcome.map(|()| self.session.value)
    }

    fn event_loop(&mut self, decoder: &mut KeyDecoder) -> Result<(), PromptError> {
        self.render()?;
        loop {
            match decoder.next_event() {
                InputEvent::Key(key) => self.press_key(&key)?,
                InputEvent::Cancelled => {
                    info!("{}: cancelled externally", self.name);
                    self.press_key(&Key::named(KeyName::Cancel))?;
                    if !self.session.state.is_terminal() {
                        // Cancel is unbound in this prompt's table
                        self.session.state = PromptState::Cancel;
                        self.settle()?;
                    }
                }
                InputEvent::Closed => {
                    warn!("{}: input closed in state {}", self.name, self.session.state);
                    self.renderer.finish()?;
                    return Err(PromptError::InputClosed);
                }
            }

            match self.session.state {
                PromptState::Submit => {
                    self.renderer.finish()?;
                    return Ok(());
                }
                PromptState::Cancel => {
                    self.renderer.finish()?;
                    return Err(PromptError::Cancelled);
                }
                _ => {}
            }
        }
    }
}

// ============================================================================
// Cancellation waiter
// ============================================================================

/// Watches a cancellation token on its own thread for the length of a run.
struct CancelWaiter {
    done: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl CancelWaiter {
    fn spawn(
        token: CancellationToken,
        terminal: SharedTerminal,
        tx: Sender<InputMessage>,
    ) -> io::Result<Self> {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let handle = thread::Builder::new()
            .name("promptkit-cancel".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        warn!("Failed to start cancellation waiter runtime: {}", e);
                        return;
                    }
                };
                runtime.block_on(async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            restore_shared(&terminal);
                            let _ = tx.send(InputMessage::Cancel);
                        }
                        _ = done_rx => {}
                    }
                });
            })?;
        Ok(Self {
            done: Some(done_tx),
            handle,
        })
    }

    fn stop(mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
        if self.handle.join().is_err() {
            warn!("Cancellation waiter panicked");
        }
    }
}
