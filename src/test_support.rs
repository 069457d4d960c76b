//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::action::AliasTable;
use crate::tui::input::InputSource;
use crate::tui::prompt::PromptOptions;
use crate::tui::terminal::TerminalMode;

/// In-memory output that stays readable after being boxed into a renderer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TerminalLog {
    raw: bool,
    enables: usize,
    restores: usize,
}

/// Terminal double that records raw-mode transitions.
#[derive(Clone, Default)]
pub struct RecordingTerminal {
    log: Arc<Mutex<TerminalLog>>,
}

impl RecordingTerminal {
    pub fn is_raw(&self) -> bool {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).raw
    }

    pub fn enable_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).enables
    }

    /// Restores that actually left raw mode.
    pub fn restore_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).restores
    }
}

impl TerminalMode for RecordingTerminal {
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.raw = true;
        log.enables += 1;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if log.raw {
            log.raw = false;
            log.restores += 1;
        }
        Ok(())
    }
}

/// A reader that blocks until bytes are pushed through its sender, and
/// reports EOF once the sender is dropped.
pub struct ChannelReader {
    rx: Receiver<Vec<u8>>,
    buffered: Vec<u8>,
}

pub fn channel_reader() -> (Sender<Vec<u8>>, ChannelReader) {
    let (tx, rx) = mpsc::channel();
    (
        tx,
        ChannelReader {
            rx,
            buffered: Vec::new(),
        },
    )
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.buffered.is_empty() {
            match self.rx.recv() {
                Ok(bytes) => self.buffered = bytes,
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.buffered.len());
        buf[..n].copy_from_slice(&self.buffered[..n]);
        self.buffered.drain(..n);
        Ok(n)
    }
}

/// Options for a prompt fed from `input`, writing into `output`, with the
/// default alias table and a recording terminal.
pub fn test_options(input: &[u8], output: &SharedBuffer) -> (PromptOptions, RecordingTerminal) {
    let terminal = RecordingTerminal::default();
    let options = PromptOptions {
        input: InputSource::reader(io::Cursor::new(input.to_vec())),
        output: Some(Box::new(output.clone())),
        terminal: Some(Box::new(terminal.clone())),
        aliases: Some(AliasTable::default()),
        ..PromptOptions::default()
    };
    (options, terminal)
}
