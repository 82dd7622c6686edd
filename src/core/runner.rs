//! # Run a single attempt of a task execution.
//!
//! Executes one attempt of a [`Task`](crate::Task) on a [`Substrate`] with a timeout and
//! publishes lifecycle events to the [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Success:     AttemptStarting → AttemptSucceeded
//! Task error:  AttemptStarting → AttemptFailed
//! Panic:       AttemptStarting → AttemptPanicked
//! Timeout:     AttemptStarting → TimeoutHit → CancelRequested
//! Interrupted: AttemptStarting → CancelRequested
//! ```
//!
//! ## Rules
//! - Cancellation is requested for **every** attempt that is abandoned (timeout or
//!   interruption); the runner never waits for it to take effect.
//! - The outcome is returned unmodified; deciding whether to retry is the engine's job.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    events::{Bus, Event, EventKind},
    substrate::{AttemptOutcome, Substrate},
    tasks::TaskRef,
};

/// Submits attempt number `attempt` and waits up to `wait` for its outcome.
pub(crate) async fn run_attempt<S, T, E>(
    substrate: &S,
    task: &TaskRef<T, E>,
    name: &Arc<str>,
    attempt: u32,
    wait: Duration,
    interrupt: &CancellationToken,
    bus: &Bus,
) -> AttemptOutcome<T, E>
where
    S: Substrate,
    T: Send + 'static,
    E: Send + 'static,
{
    bus.publish(
        Event::new(EventKind::AttemptStarting)
            .with_task(Arc::clone(name))
            .with_attempt(attempt)
            .with_wait(wait),
    );

    let mut handle = substrate.submit(Arc::clone(task), attempt);
    let outcome = substrate.await_result(&mut handle, wait, interrupt).await;

    match &outcome {
        AttemptOutcome::Success(_) => publish(bus, EventKind::AttemptSucceeded, name, attempt),
        AttemptOutcome::Failed(_) => publish(bus, EventKind::AttemptFailed, name, attempt),
        AttemptOutcome::Panicked { reason } => bus.publish(
            Event::new(EventKind::AttemptPanicked)
                .with_task(Arc::clone(name))
                .with_attempt(attempt)
                .with_reason(reason.as_str()),
        ),
        AttemptOutcome::TimedOut => {
            bus.publish(
                Event::new(EventKind::TimeoutHit)
                    .with_task(Arc::clone(name))
                    .with_attempt(attempt)
                    .with_wait(wait),
            );
            substrate.request_cancel(&handle);
            publish(bus, EventKind::CancelRequested, name, attempt);
        }
        AttemptOutcome::Interrupted => {
            substrate.request_cancel(&handle);
            publish(bus, EventKind::CancelRequested, name, attempt);
        }
    }
    outcome
}

fn publish(bus: &Bus, kind: EventKind, name: &Arc<str>, attempt: u32) {
    bus.publish(
        Event::new(kind)
            .with_task(Arc::clone(name))
            .with_attempt(attempt),
    );
}
