//! # Task abstraction.
//!
//! This module defines the [`Task`] trait: a named, **blocking** unit of work that
//! produces `Result<T, E>` and receives a [`CancellationToken`].
//! The common handle type is [`TaskRef`], an `Arc<dyn Task<T, E>>` suitable for
//! resubmitting the same work on every attempt.
//!
//! Cancellation is cooperative: the engine cancels the token when it gives up on an
//! attempt, and the task is expected to check it and return early.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Shared handle to a task.
pub type TaskRef<T, E> = Arc<dyn Task<T, E>>;

/// # Blocking, cancelable unit of work.
///
/// `run` executes on a worker thread supplied by a [`Substrate`](crate::Substrate),
/// never on the caller's thread. It may be called once per attempt, so implementations
/// must not assume they run only once.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use taskbound::Task;
///
/// struct Probe;
///
/// impl Task<u16, std::io::Error> for Probe {
///     fn name(&self) -> &str { "probe" }
///
///     fn run(&self, ctx: CancellationToken) -> Result<u16, std::io::Error> {
///         if ctx.is_cancelled() {
///             return Err(std::io::ErrorKind::Interrupted.into());
///         }
///         // poll the remote system...
///         std::thread::sleep(Duration::from_millis(1));
///         Ok(200)
///     }
/// }
/// ```
pub trait Task<T, E>: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes one attempt until completion or cancellation.
    fn run(&self, ctx: CancellationToken) -> Result<T, E>;
}
