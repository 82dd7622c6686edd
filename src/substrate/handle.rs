//! # In-flight attempts.
//!
//! A substrate hands out an [`AttemptHandle`] for every submitted attempt and keeps the
//! matching [`AttemptSender`] on the worker side:
//!
//! ```text
//!   caller side                               worker thread
//!   AttemptHandle ◄──── oneshot ─────────── AttemptSender::run(task)
//!     ├─ wait(timeout, interrupt)             ├─ skipped if already cancelled
//!     └─ cancel() ──► CancellationToken ────► └─ task.run(token) (panics caught)
//! ```
//!
//! ## Rules
//! - `wait` resolves to exactly one [`AttemptOutcome`] per call.
//! - Interruption wins over a deadline that elapsed at the same time.
//! - A sender dropped without a result (attempt never started) reads as `Interrupted`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::{sync::oneshot, time};
use tokio_util::sync::CancellationToken;

use crate::subscribers::panic_message;
use crate::tasks::Task;

/// What the worker side reports: the task's own result, or a panic payload.
pub type AttemptResult<T, E> = std::thread::Result<Result<T, E>>;

/// Classified result of waiting on one attempt.
#[derive(Debug)]
pub enum AttemptOutcome<T, E> {
    /// The task returned a value.
    Success(T),
    /// The task returned its own error.
    Failed(E),
    /// The task panicked.
    Panicked { reason: String },
    /// The budget elapsed before the task finished.
    TimedOut,
    /// The caller was interrupted while waiting.
    Interrupted,
}

impl<T, E> AttemptOutcome<T, E> {
    /// Only timeouts are worth another attempt.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptOutcome::TimedOut)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "attempt_succeeded",
            AttemptOutcome::Failed(_) => "attempt_failed",
            AttemptOutcome::Panicked { .. } => "attempt_panicked",
            AttemptOutcome::TimedOut => "attempt_timed_out",
            AttemptOutcome::Interrupted => "attempt_interrupted",
        }
    }
}

/// Caller-side view of one submitted attempt.
#[derive(Debug)]
pub struct AttemptHandle<T, E> {
    attempt: u32,
    task: Arc<str>,
    token: CancellationToken,
    finished: Arc<AtomicBool>,
    result: oneshot::Receiver<AttemptResult<T, E>>,
}

/// Worker-side half of an attempt; delivers the result to its [`AttemptHandle`].
#[derive(Debug)]
pub struct AttemptSender<T, E> {
    token: CancellationToken,
    tx: oneshot::Sender<AttemptResult<T, E>>,
    _done: DoneOnDrop,
}

/// Flips the shared flag once the worker side lets go of the attempt.
#[derive(Debug)]
struct DoneOnDrop(Arc<AtomicBool>);

impl Drop for DoneOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

impl<T, E> AttemptHandle<T, E> {
    /// Creates a connected sender/handle pair for attempt number `attempt` of `task`.
    pub fn channel(attempt: u32, task: impl Into<Arc<str>>) -> (AttemptSender<T, E>, Self) {
        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let (tx, result) = oneshot::channel();
        let sender = AttemptSender {
            token: token.clone(),
            tx,
            _done: DoneOnDrop(Arc::clone(&finished)),
        };
        let handle = Self {
            attempt,
            task: task.into(),
            token,
            finished,
            result,
        };
        (sender, handle)
    }

    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[inline]
    pub fn task_name(&self) -> &str {
        &self.task
    }

    /// `true` once [`cancel`](Self::cancel) was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `true` once the worker side is done with the attempt: the task returned or
    /// panicked, or it was dropped before it started.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Requests cooperative cancellation of the attempt.
    ///
    /// Does not wait for the task to observe it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits up to `timeout` for the attempt to finish, or until `interrupt` fires.
    ///
    /// Must not be called again after it returned a completed outcome
    /// (`Success`, `Failed`, `Panicked`).
    pub async fn wait(
        &mut self,
        timeout: Duration,
        interrupt: &CancellationToken,
    ) -> AttemptOutcome<T, E> {
        let waited = tokio::select! {
            biased;
            _ = interrupt.cancelled() => return AttemptOutcome::Interrupted,
            res = time::timeout(timeout, &mut self.result) => res,
        };

        match waited {
            Err(_elapsed) => AttemptOutcome::TimedOut,
            Ok(Err(_closed)) => AttemptOutcome::Interrupted,
            Ok(Ok(Ok(Ok(value)))) => AttemptOutcome::Success(value),
            Ok(Ok(Ok(Err(err)))) => AttemptOutcome::Failed(err),
            Ok(Ok(Err(payload))) => AttemptOutcome::Panicked {
                reason: panic_message(&*payload),
            },
        }
    }
}

impl<T: 'static, E: 'static> AttemptSender<T, E> {
    /// Token the task will receive.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Runs `task` on the current thread and delivers its result.
    ///
    /// Does nothing (and closes the channel) if the attempt was cancelled before it started.
    pub fn run(self, task: &dyn Task<T, E>) {
        if self.token.is_cancelled() {
            return;
        }
        let ctx = self.token.clone();
        let res = std::panic::catch_unwind(AssertUnwindSafe(|| task.run(ctx)));
        let _ = self.tx.send(res);
    }
}
