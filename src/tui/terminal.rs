//! Raw-mode acquisition and release.
//!
//! A prompt runs with the terminal in raw mode: keystrokes arrive unbuffered
//! and unechoed. Restoration must happen on every exit path, and may be
//! triggered from the cancellation waiter thread, so the terminal lives
//! behind a shared mutex and `restore` is idempotent.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::terminal;
use log::{debug, warn};

/// Something that can put an input device into raw mode and back.
pub trait TerminalMode: Send {
    fn enable_raw_mode(&mut self) -> io::Result<()>;

    /// Return to the mode that was active before `enable_raw_mode`.
    /// Calling this more than once is harmless.
    fn restore(&mut self) -> io::Result<()>;
}

/// Raw mode on the controlling terminal via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermTerminal {
    enabled: bool,
}

impl TerminalMode for CrosstermTerminal {
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if !self.enabled {
            terminal::enable_raw_mode()?;
            self.enabled = true;
            debug!("Raw mode enabled");
        }
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.enabled {
            terminal::disable_raw_mode()?;
            self.enabled = false;
            debug!("Raw mode disabled");
        }
        Ok(())
    }
}

/// No-op terminal for piped input and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedTerminal;

impl TerminalMode for DetachedTerminal {
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub type SharedTerminal = Arc<Mutex<Box<dyn TerminalMode>>>;

pub fn shared(terminal: Box<dyn TerminalMode>) -> SharedTerminal {
    Arc::new(Mutex::new(terminal))
}

/// Restore a shared terminal, logging instead of failing.
pub fn restore_shared(terminal: &SharedTerminal) {
    let mut guard = terminal.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = guard.restore() {
        warn!("Failed to restore terminal mode: {}", e);
    }
}

/// Holds raw mode for as long as it lives.
pub struct RawModeGuard {
    terminal: SharedTerminal,
}

impl RawModeGuard {
    pub fn acquire(terminal: SharedTerminal) -> io::Result<Self> {
        terminal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .enable_raw_mode()?;
        Ok(Self { terminal })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        restore_shared(&self.terminal);
    }
}
