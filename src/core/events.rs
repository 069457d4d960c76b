//! # Lifecycle events
//!
//! Per-prompt listener registry. Listeners are plain closures receiving the
//! prompt's session state and the emitted signal; they run synchronously in
//! registration order. Registration returns a `ListenerId` that is the only
//! way to remove a listener again.

use log::debug;

use super::key::Key;

/// Discriminant used to subscribe to a class of signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Key,
    Validate,
    Error,
    Finalize,
    Cancel,
    Submit,
}

/// A lifecycle signal together with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal<'a> {
    /// A decoded keystroke, before any state transition it causes.
    Key(&'a Key),
    /// Validation of the current value has started.
    Validate,
    /// Validation failed with the given message.
    Error(&'a str),
    /// The prompt has decided its outcome; fires before the final render.
    Finalize,
    Cancel,
    Submit,
}

impl Signal<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Signal::Key(_) => EventKind::Key,
            Signal::Validate => EventKind::Validate,
            Signal::Error(_) => EventKind::Error,
            Signal::Finalize => EventKind::Finalize,
            Signal::Cancel => EventKind::Cancel,
            Signal::Submit => EventKind::Submit,
        }
    }
}

/// Stable handle returned by `on`/`once`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<S> = Box<dyn FnMut(&mut S, &Signal<'_>)>;

struct Entry<S> {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    listener: Listener<S>,
}

pub struct EventBus<S> {
    entries: Vec<Entry<S>>,
    next_id: u64,
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> EventBus<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a listener that fires on every matching signal.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&mut S, &Signal<'_>) + 'static,
    {
        self.register(kind, false, Box::new(listener))
    }

    /// Register a listener that removes itself after its first invocation.
    pub fn once<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&mut S, &Signal<'_>) + 'static,
    {
        self.register(kind, true, Box::new(listener))
    }

    fn register(&mut self, kind: EventKind, once: bool, listener: Listener<S>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            kind,
            once,
            listener,
        });
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Invoke every listener for the signal's kind, in registration order.
    ///
    /// Returns the number of listeners that ran.
    pub fn emit(&mut self, state: &mut S, signal: &Signal<'_>) -> usize {
        let kind = signal.kind();
        let mut fired = 0;
        for entry in self.entries.iter_mut().filter(|entry| entry.kind == kind) {
            (entry.listener)(state, signal);
            fired += 1;
        }
        self.entries.retain(|entry| !(entry.once && entry.kind == kind));
        if kind != EventKind::Key {
            debug!("Emitted {:?} to {} listeners", kind, fired);
        }
        fired
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
}
