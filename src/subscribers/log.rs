//! # LogWriter - simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [starting] task="quote" attempt=1 wait_ms=50
//! [timeout] task="quote" attempt=1 wait_ms=50
//! [cancel-requested] task="quote" attempt=1
//! [backoff] task="quote" after_attempt=1 next_wait_ms=100
//! [starting] task="quote" attempt=2 wait_ms=100
//! [succeeded] task="quote" attempt=2
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("unknown");
        let attempt = e.attempt.unwrap_or(0);
        match e.kind {
            EventKind::AttemptStarting => {
                println!(
                    "[starting] task={task:?} attempt={attempt} wait_ms={:?}",
                    e.wait_ms
                );
            }
            EventKind::AttemptSucceeded => {
                println!("[succeeded] task={task:?} attempt={attempt}");
            }
            EventKind::AttemptFailed => {
                println!("[failed] task={task:?} attempt={attempt}");
            }
            EventKind::AttemptPanicked => {
                println!(
                    "[panicked] task={task:?} attempt={attempt} info={:?}",
                    e.reason
                );
            }
            EventKind::TimeoutHit => {
                println!(
                    "[timeout] task={task:?} attempt={attempt} wait_ms={:?}",
                    e.wait_ms
                );
            }
            EventKind::CancelRequested => {
                println!("[cancel-requested] task={task:?} attempt={attempt}");
            }
            EventKind::BackoffScheduled => {
                println!(
                    "[backoff] task={task:?} after_attempt={attempt} next_wait_ms={:?}",
                    e.wait_ms
                );
            }
            EventKind::Interrupted => {
                println!("[interrupted] task={task:?} attempt={attempt}");
            }
            EventKind::DeadlineExceeded => {
                println!(
                    "[deadline-exceeded] task={task:?} attempts={attempt} last_wait_ms={:?}",
                    e.wait_ms
                );
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={task} reason={:?}",
                    e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={task} info={}",
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
