//! # Runtime events emitted by the engine.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Attempt events**: one attempt's lifecycle (starting, succeeded, failed, timeout, cancel)
//! - **Execution events**: terminal or between-attempt decisions (backoff, deadline, interruption)
//! - **Subscriber events**: delivery problems of the fan-out layer (overflow, panic)
//!
//! The [`Event`] struct carries metadata such as the task name, attempt number and wait budget.
//!
//! ## Ordering guarantees
//! Every event published on a [`Bus`](crate::events::Bus) receives a sequence number (`seq`)
//! that increases monotonically per bus. Use `seq` to restore the exact order when events
//! are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskbound::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_task("fetch-quote")
//!     .with_attempt(2)
//!     .with_wait(Duration::from_millis(40));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.task.as_deref(), Some("fetch-quote"));
//! assert_eq!(ev.wait_ms, Some(40));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Attempt events ===
    /// An attempt was submitted to the substrate.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: attempt number (1-based, per execution)
    /// - `wait_ms`: budget of this attempt (ms)
    AttemptStarting,

    /// The attempt completed with a value.
    ///
    /// Sets:
    /// - `task`, `attempt`
    AttemptSucceeded,

    /// The attempt completed with the task's own error (not retried).
    ///
    /// Sets:
    /// - `task`, `attempt`
    ///
    /// The error value itself is returned to the caller, not copied into the event.
    AttemptFailed,

    /// The task panicked during the attempt (not retried).
    ///
    /// Sets:
    /// - `task`, `attempt`
    /// - `reason`: panic message
    AttemptPanicked,

    /// The attempt did not finish within its budget.
    ///
    /// Sets:
    /// - `task`, `attempt`
    /// - `wait_ms`: the exceeded budget (ms)
    TimeoutHit,

    /// Cancellation was requested for an abandoned attempt.
    ///
    /// Sets:
    /// - `task`, `attempt`
    CancelRequested,

    // === Execution events ===
    /// The wait budget was advanced; another attempt follows.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: attempt that just timed out
    /// - `wait_ms`: budget of the next attempt (ms)
    BackoffScheduled,

    /// The caller was interrupted; the execution stops without retrying.
    ///
    /// Sets:
    /// - `task`, `attempt`
    Interrupted,

    /// Every permitted attempt timed out.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: number of attempts made
    /// - `wait_ms`: budget of the final attempt (ms)
    DeadlineExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: per-bus monotonic sequence, assigned on publish
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Monotonically increasing sequence number (0 until published).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Wait budget in milliseconds (compact).
    pub wait_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind stamped with the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            task: None,
            attempt: None,
            wait_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a wait budget (stored as milliseconds, saturating).
    #[inline]
    pub fn with_wait(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.wait_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// `true` for events that end an execution.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::AttemptSucceeded
                | EventKind::AttemptFailed
                | EventKind::AttemptPanicked
                | EventKind::Interrupted
                | EventKind::DeadlineExceeded
        )
    }
}
