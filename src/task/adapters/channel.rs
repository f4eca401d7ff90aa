//! Event listeners that forward into a tokio channel.

use crate::task::ports::{StorageEvent, StorageEventListener, TaskEvent, TaskEventListener};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// Forwards every event into an unbounded channel.
///
/// Sending never blocks the mutating task. Events are dropped once the
/// receiver has gone away. `E` selects the event stream: [`TaskEvent`] for
/// the service, [`StorageEvent`] for a storage adapter.
#[derive(Debug, Clone)]
pub struct ChannelEventListener<E = TaskEvent> {
    sender: UnboundedSender<E>,
}

impl<E> ChannelEventListener<E> {
    /// Creates a listener and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<E>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Wraps an existing sender.
    #[must_use]
    pub const fn from_sender(sender: UnboundedSender<E>) -> Self {
        Self { sender }
    }

    fn forward(&self, event: E) {
        if self.sender.send(event).is_err() {
            debug!("event receiver dropped; discarding event");
        }
    }
}

impl TaskEventListener for ChannelEventListener<TaskEvent> {
    fn on_event(&self, event: &TaskEvent) {
        self.forward(event.clone());
    }
}

impl StorageEventListener for ChannelEventListener<StorageEvent> {
    fn on_storage_event(&self, event: &StorageEvent) {
        self.forward(event.clone());
    }
}
