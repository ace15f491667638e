//! Change notification for the UI layer.
//!
//! Observers register a callback and receive every [`ChangeEvent`] as it is
//! emitted. Events are also queued so a host loop can drain them in one
//! batch with [`EventBus::poll`] instead of (or as well as) subscribing.

use dash_core::NodeId;
use std::fmt;

/// What changed in the document or editor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Nodes were added, removed, reparented or re-ordered.
    HierarchyChanged,
    GeometryChanged(NodeId),
    /// A property changed; carries the dotted path that was written.
    PropertyChanged(NodeId, String),
    SelectionChanged,
    /// Derived display text was re-evaluated.
    ContentRefreshed(NodeId),
    /// The whole document was replaced (new/open/import).
    DocumentReplaced,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ChangeEvent)>;

/// Observer registry with a deferred queue.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
    queue: Vec<ChangeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It runs synchronously inside [`emit`](Self::emit).
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: ChangeEvent) {
        log::trace!("emit {event:?}");
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
        self.queue.push(event);
    }

    pub fn emit_all(&mut self, events: impl IntoIterator<Item = ChangeEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Drain every event emitted since the last poll.
    pub fn poll(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}
