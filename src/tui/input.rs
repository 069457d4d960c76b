//! # Input
//!
//! Raw bytes are read on dedicated threads and delivered over a channel; the
//! `KeyDecoder` turns them into `Key`s on the prompt's own thread.
//!
//! ```text
//!   stdin ──▶ [InputHub reader thread] ──────┐
//!   shared Read ──▶ [InputHub reader thread] ├──▶ mpsc ──▶ KeyDecoder ──▶ Key
//!   custom Read ──▶ [per-session thread] ────┘     ▲
//!                                                  └── cancellation waiter
//! ```
//!
//! An `InputHub` owns one reader for as many prompts as use it; standard
//! input always goes through a process-wide hub. The hub forwards bytes to
//! whichever prompt is subscribed and buffers whatever arrives in between.
//! When a prompt finishes, the bytes it received but never decoded go back
//! to the front of that buffer, so keystrokes typed ahead of one prompt
//! reach the next one and no blocked read is left behind.
//!
//! An ESC byte may start a cursor sequence (`ESC [ A`). The decoder waits a
//! bounded time for the rest with `recv_timeout`, so a lone ESC still comes
//! out as Escape without spawning anything.

use std::collections::VecDeque;
use std::io::{self, IsTerminal, Read};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::core::key::{Key, KeyName};

const READ_BUFFER_SIZE: usize = 1024;

/// Message delivered to a session's decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMessage {
    Bytes(Vec<u8>),
    /// The stream ended or failed for good.
    Closed,
    /// External cancellation; sent by the waiter after restoring the terminal.
    Cancel,
}

/// Where a prompt reads its keystrokes from.
#[derive(Default)]
pub enum InputSource {
    #[default]
    Stdin,
    /// Owned by a single prompt; dropped with it.
    Reader(Box<dyn Read + Send>),
    /// Shared by consecutive prompts.
    Hub(Arc<InputHub>),
}

impl InputSource {
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        InputSource::Reader(Box::new(reader))
    }

    pub fn hub(hub: &Arc<InputHub>) -> Self {
        InputSource::Hub(Arc::clone(hub))
    }

    /// True when raw mode makes sense: standard input attached to a terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, InputSource::Stdin) && io::stdin().is_terminal()
    }

    /// Start delivering bytes to `tx`. Delivery stops when the returned
    /// attachment is released or dropped.
    pub fn attach(self, tx: Sender<InputMessage>) -> io::Result<InputAttachment> {
        match self {
            InputSource::Stdin => Ok(InputAttachment::subscribe(Arc::clone(&STDIN_HUB), tx)),
            InputSource::Hub(hub) => Ok(InputAttachment::subscribe(hub, tx)),
            InputSource::Reader(reader) => {
                thread::Builder::new()
                    .name("promptkit-input".to_string())
                    .spawn(move || {
                        read_loop(reader, |message| tx.send(message).is_ok());
                    })?;
                Ok(InputAttachment { hub: None })
            }
        }
    }
}

/// Keeps a session subscribed to its input source.
pub struct InputAttachment {
    hub: Option<(Arc<InputHub>, u64)>,
}

impl InputAttachment {
    fn subscribe(hub: Arc<InputHub>, tx: Sender<InputMessage>) -> Self {
        let id = hub.subscribe(tx);
        InputAttachment { hub: Some((hub, id)) }
    }

    /// Stop delivery and hand whatever `decoder` has not turned into keys
    /// back to the hub for the next subscriber.
    pub fn release(mut self, decoder: KeyDecoder) {
        if let Some((hub, id)) = self.hub.take() {
            hub.unsubscribe(id, Some(decoder));
        }
    }
}

impl Drop for InputAttachment {
    fn drop(&mut self) {
        if let Some((hub, id)) = self.hub.take() {
            hub.unsubscribe(id, None);
        }
    }
}

/// Pump `reader` into `deliver` until EOF, a hard error, or `deliver`
/// reports that nobody is listening.
fn read_loop<R: Read + ?Sized>(mut reader: Box<R>, mut deliver: impl FnMut(InputMessage) -> bool) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("Input stream reached EOF");
                deliver(InputMessage::Closed);
                return;
            }
            Ok(n) => {
                if !deliver(InputMessage::Bytes(buf[..n].to_vec())) {
                    debug!("Input receiver gone, reader thread exiting");
                    return;
                }
            }
            Err(e) if is_transient(&e) => {
                if e.kind() == io::ErrorKind::WouldBlock {
                    thread::sleep(Duration::from_millis(10));
                }
            }
            Err(e) => {
                warn!("Input stream failed: {}", e);
                deliver(InputMessage::Closed);
                return;
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

// ============================================================================
// Shared reader
// ============================================================================

static STDIN_HUB: LazyLock<Arc<InputHub>> =
    LazyLock::new(|| InputHub::named("promptkit-stdin", Box::new(io::stdin())));

/// One reader shared by consecutive prompts.
///
/// The reader thread starts with the first subscription and keeps reading
/// until EOF, whether or not a prompt is listening.
pub struct InputHub {
    thread_name: &'static str,
    reader: Mutex<Option<Box<dyn Read + Send>>>,
    state: Mutex<HubState>,
}

#[derive(Default)]
struct HubState {
    closed: bool,
    subscriber: Option<(u64, Sender<InputMessage>)>,
    backlog: Vec<u8>,
    next_id: u64,
}

impl InputHub {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Arc<Self> {
        Self::named("promptkit-hub", Box::new(reader))
    }

    fn named(thread_name: &'static str, reader: Box<dyn Read + Send>) -> Arc<Self> {
        Arc::new(Self {
            thread_name,
            reader: Mutex::new(Some(reader)),
            state: Mutex::new(HubState::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(self: &Arc<Self>) {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(reader) = reader else {
            return;
        };
        let hub = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(self.thread_name.to_string())
            .spawn(move || read_loop(reader, |message| hub.deliver(message)));
        match spawned {
            Ok(_) => info!("Started {} reader thread", self.thread_name),
            Err(e) => {
                warn!("Failed to start {} reader thread: {}", self.thread_name, e);
                self.lock().closed = true;
            }
        }
    }

    fn subscribe(self: &Arc<Self>, tx: Sender<InputMessage>) -> u64 {
        self.start();
        let mut state = self.lock();
        if !state.backlog.is_empty() {
            debug!("Replaying {} buffered input bytes", state.backlog.len());
            let _ = tx.send(InputMessage::Bytes(std::mem::take(&mut state.backlog)));
        }
        if state.closed {
            let _ = tx.send(InputMessage::Closed);
        }

        let id = state.next_id;
        state.next_id += 1;
        state.subscriber = Some((id, tx));
        id
    }

    /// Drop subscriber `id`. Bytes its decoder still holds are put back in
    /// front of anything buffered since.
    fn unsubscribe(&self, id: u64, decoder: Option<KeyDecoder>) {
        let mut state = self.lock();
        if state.subscriber.as_ref().is_some_and(|(current, _)| *current == id) {
            state.subscriber = None;
        }
        // Nothing more reaches the decoder's channel once the lock is held
        // without it subscribed.
        let Some(decoder) = decoder else {
            return;
        };
        let mut unused = decoder.into_unused();
        if !unused.is_empty() {
            debug!("Returning {} unread input bytes", unused.len());
            unused.append(&mut state.backlog);
            state.backlog = unused;
        }
    }

    /// Runs on the reader thread. Always keeps reading: the hub outlives prompts.
    fn deliver(&self, message: InputMessage) -> bool {
        let mut state = self.lock();
        if message == InputMessage::Closed {
            state.closed = true;
        }
        let undelivered = match &state.subscriber {
            Some((_, tx)) => tx.send(message).err().map(|returned| returned.0),
            None => Some(message),
        };
        let Some(undelivered) = undelivered else {
            return true;
        };
        // A subscriber whose receiver is gone is as good as none
        state.subscriber = None;
        if let InputMessage::Bytes(bytes) = undelivered {
            state.backlog.extend(bytes);
        }
        true
    }
}

// ============================================================================
// Key decoding
// ============================================================================

/// What the decoder produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    /// External cancellation arrived. Sticky.
    Cancelled,
    /// No more input. Sticky once buffered bytes are used up.
    Closed,
}

pub struct KeyDecoder {
    rx: Receiver<InputMessage>,
    pending: VecDeque<u8>,
    escape_timeout: Duration,
    closed: bool,
    cancelled: bool,
}

impl KeyDecoder {
    pub fn new(rx: Receiver<InputMessage>, escape_timeout: Duration) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
            escape_timeout,
            closed: false,
            cancelled: false,
        }
    }

    /// Block until one key is decoded, cancellation arrives, or input ends.
    ///
    /// Cancellation takes priority over bytes already buffered.
    pub fn next_event(&mut self) -> InputEvent {
        self.drain_ready();
        if !self.cancelled {
            self.fill_to(1, None);
        }
        if self.cancelled {
            return InputEvent::Cancelled;
        }
        let Some(&first) = self.pending.front() else {
            return InputEvent::Closed;
        };

        let key = match first {
            0x1b => self.decode_escape(),
            0x80..=0xff => self.decode_utf8(first),
            _ => {
                self.pending.pop_front();
                decode_byte(first)
            }
        };
        if self.cancelled {
            return InputEvent::Cancelled;
        }
        InputEvent::Key(key)
    }

    /// Bytes received but not yet decoded, including anything still queued
    /// in the channel. Cancel and Closed markers are dropped.
    pub fn into_unused(self) -> Vec<u8> {
        let KeyDecoder { rx, pending, .. } = self;
        let mut unused: Vec<u8> = pending.into();
        while let Ok(message) = rx.try_recv() {
            if let InputMessage::Bytes(bytes) = message {
                unused.extend(bytes);
            }
        }
        unused
    }

    fn absorb(&mut self, message: InputMessage) {
        match message {
            InputMessage::Bytes(bytes) => self.pending.extend(bytes),
            InputMessage::Closed => self.closed = true,
            InputMessage::Cancel => self.cancelled = true,
        }
    }

    fn drain_ready(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(message) => self.absorb(message),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    return;
                }
            }
        }
    }

    /// Receive until `pending` holds `len` bytes, the stream closes,
    /// cancellation arrives, or `deadline` passes.
    fn fill_to(&mut self, len: usize, deadline: Option<Instant>) {
        while self.pending.len() < len && !self.closed && !self.cancelled {
            let message = match deadline {
                None => self.rx.recv().ok(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    match self.rx.recv_timeout(deadline - now) {
                        Ok(message) => Some(message),
                        Err(RecvTimeoutError::Timeout) => return,
                        Err(RecvTimeoutError::Disconnected) => None,
                    }
                }
            };
            match message {
                Some(message) => self.absorb(message),
                None => self.closed = true,
            }
        }
    }

    fn decode_escape(&mut self) -> Key {
        let deadline = Instant::now() + self.escape_timeout;
        self.fill_to(2, Some(deadline));
        if self.pending.get(1) == Some(&b'[') {
            self.fill_to(3, Some(deadline));
        }

        let second = self.pending.get(1).copied();
        let third = self.pending.get(2).copied();
        let name = match (second, third) {
            (Some(b'['), Some(b'A')) => Some(KeyName::Up),
            (Some(b'['), Some(b'B')) => Some(KeyName::Down),
            (Some(b'['), Some(b'C')) => Some(KeyName::Right),
            (Some(b'['), Some(b'D')) => Some(KeyName::Left),
            (Some(b'['), Some(b'H')) => Some(KeyName::Home),
            (Some(b'['), Some(b'F')) => Some(KeyName::End),
            _ => None,
        };

        match name {
            Some(name) => {
                self.pending.drain(..3);
                Key::named(name)
            }
            None => {
                // Anything after a lone ESC stays in the stream as literal input
                self.pending.pop_front();
                Key::named(KeyName::Escape)
            }
        }
    }

    fn decode_utf8(&mut self, lead: u8) -> Key {
        let width = utf8_width(lead);
        if width > 1 {
            let deadline = Instant::now() + self.escape_timeout;
            self.fill_to(width, Some(deadline));
        }

        let bytes: Vec<u8> = self.pending.iter().take(width).copied().collect();
        let decoded = std::str::from_utf8(&bytes)
            .ok()
            .filter(|_| width > 1 && bytes.len() == width)
            .and_then(|s| s.chars().next());

        match decoded {
            Some(c) => {
                self.pending.drain(..width);
                Key::char(c)
            }
            None => {
                self.pending.pop_front();
                Key::char(char::REPLACEMENT_CHARACTER)
            }
        }
    }
}

/// Expected sequence length for a UTF-8 lead byte; 1 for invalid leads.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    }
}

fn decode_byte(byte: u8) -> Key {
    match byte {
        b'\r' | b'\n' => Key::named(KeyName::Enter),
        b' ' => Key::named(KeyName::Space),
        0x08 | 0x7f => Key::named(KeyName::Backspace),
        b'\t' => Key::named(KeyName::Tab),
        0x03 => Key::named(KeyName::Cancel),
        0x00..=0x1f => Key::control(byte as char),
        _ => Key::char(byte as char),
    }
}
