//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`] - distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// One subscriber's queue and the worker draining it.
struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

impl Lane {
    fn open(sub: Arc<dyn Subscribe>, bus: Bus) -> Self {
        let name = sub.name();
        let (queue, rx) = mpsc::channel(sub.queue_capacity().max(1));
        let worker = tokio::spawn(deliver(sub, rx, bus));
        Self {
            name,
            queue,
            worker,
        }
    }
}

/// Feeds queued events to `sub` one at a time until the queue closes.
///
/// A panicking `on_event` is reported on the bus and the next event is delivered as usual.
async fn deliver(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(event) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_event(&event))
            .catch_unwind()
            .await;
        if let Err(payload) = handled {
            bus.publish(Event::subscriber_panicked(
                sub.name(),
                panic_message(&*payload),
            ));
        }
    }
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    dropped: AtomicU64,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime when `subs` is non-empty.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| Lane::open(sub, bus.clone()))
            .collect();
        Self {
            lanes,
            dropped: AtomicU64::new(0),
            bus,
        }
    }

    /// `true` if no subscribers were registered.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Events dropped so far across all subscribers (full or closed queue).
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Emits an event to all subscribers.
    ///
    /// On a full or closed queue the event is dropped for that subscriber and
    /// `SubscriberOverflow` is published, unless the event is itself an overflow report.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());

        for lane in &self.lanes {
            let reason = match lane.queue.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            self.dropped.fetch_add(1, Ordering::Relaxed);
            if !shared.is_subscriber_overflow() {
                self.bus
                    .publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        for Lane { queue, worker, .. } in self.lanes {
            drop(queue);
            let _ = worker.await;
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
