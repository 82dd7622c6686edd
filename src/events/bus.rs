//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from every `execute()` call of an engine.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Subscribers:
//!   execute() #1 ──┐
//!   execute() #2 ──┼──────► Bus ───────► listener ────► SubscriberSet
//!   execute() #N ──┘  (broadcast chan)     └──────────► Engine::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.
//! - **Sequencing**: `seq` is stamped on publish from a counter owned by this bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: clones share the channel and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Stamps `ev` with the next sequence number and publishes it.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, mut ev: Event) {
        ev.seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_assigns_increasing_seq() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::AttemptStarting));
        bus.clone().publish(Event::new(EventKind::TimeoutHit));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.seq >= 1);
        assert!(second.seq > first.seq);
        assert_eq!(second.kind, EventKind::TimeoutHit);
    }

    #[test]
    fn test_publish_without_receivers_is_noop() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::AttemptStarting));
    }
}
