//! Multi-subscriber output channels.
//!
//! Producers emit via [`Broadcast::emit`] and consumers attach via
//! [`Broadcast::subscribe`]. Built on [`tokio::sync::broadcast`], so each
//! subscriber sees every value sent after it subscribed and nothing before.

use tokio::sync::broadcast;

/// A broadcast sequence of `T` values with zero or more subscribers.
#[derive(Debug)]
pub struct Broadcast<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Broadcast<T> {
    /// Create a channel with the given per-subscriber buffer.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit a value to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, value: T) -> usize {
        self.tx.send(value).unwrap_or(0)
    }

    /// Subscribe to future values (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new(16)
    }
}
