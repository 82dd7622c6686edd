//! # Execution substrate trait.
//!
//! A [`Substrate`] runs attempts on threads other than the caller's. The engine needs
//! exactly three operations from it:
//!
//! ```text
//! submit(task, attempt) ──► AttemptHandle        (never blocks the caller)
//! await_result(&mut handle, timeout, interrupt)   (the only suspension point)
//! request_cancel(&handle)                          (best effort, fire-and-forget)
//! ```
//!
//! `await_result` and `request_cancel` have default implementations working on the
//! handle, so most substrates only decide *where* the task runs in `submit`:
//! create a pair with [`AttemptHandle::channel`] and call [`AttemptSender::run`]
//! on the worker thread.
//!
//! [`AttemptSender::run`]: crate::AttemptSender::run

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::substrate::handle::{AttemptHandle, AttemptOutcome};
use crate::tasks::TaskRef;

/// Worker pool / runner that executes attempts in isolation from the caller.
///
/// May be shared by many concurrent executions; implementations handle their own
/// internal synchronization.
#[async_trait]
pub trait Substrate: Send + Sync + 'static {
    /// Starts attempt number `attempt` of `task` and returns its handle immediately.
    fn submit<T, E>(&self, task: TaskRef<T, E>, attempt: u32) -> AttemptHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static;

    /// Waits for the attempt behind `handle` for at most `timeout`.
    async fn await_result<T, E>(
        &self,
        handle: &mut AttemptHandle<T, E>,
        timeout: Duration,
        interrupt: &CancellationToken,
    ) -> AttemptOutcome<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        handle.wait(timeout, interrupt).await
    }

    /// Asks the attempt behind `handle` to stop.
    fn request_cancel<T, E>(&self, handle: &AttemptHandle<T, E>) {
        handle.cancel();
    }
}
