//! # Blocking worker pool.
//!
//! [`BlockingPool`] is the default [`Substrate`]. Every attempt runs on Tokio's blocking
//! thread pool (`spawn_blocking`), so the task may block for as long as it likes without
//! stalling the async workers that drive `execute()`.
//!
//! ## Slots
//! - `unbounded()` every attempt starts immediately;
//! - `bounded(n)` at most `n` attempts run at once, others queue for a slot.
//!
//! ```text
//! submit() ──► [wait for slot | cancelled → drop, never runs] ──► spawn_blocking
//!                                                                   └─ slot held until
//!                                                                      task.run() returns
//! ```
//!
//! A slot is released only when the task body returns, even if cancellation was requested
//! earlier; a task that ignores its token keeps its slot.
//!
//! `submit` must be called from within a Tokio runtime.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::substrate::handle::AttemptHandle;
use crate::substrate::substrate::Substrate;
use crate::tasks::TaskRef;

/// Substrate running attempts on Tokio's blocking thread pool.
#[derive(Clone, Debug, Default)]
pub struct BlockingPool {
    slots: Option<Arc<Semaphore>>,
}

impl BlockingPool {
    /// Pool without a concurrency limit.
    pub fn unbounded() -> Self {
        Self { slots: None }
    }

    /// Pool running at most `max_concurrent` attempts at once (`0` = unbounded).
    pub fn bounded(max_concurrent: usize) -> Self {
        if max_concurrent == 0 {
            return Self::unbounded();
        }
        Self {
            slots: Some(Arc::new(Semaphore::new(max_concurrent))),
        }
    }

    /// Free slots right now, `None` for an unbounded pool.
    pub fn available_slots(&self) -> Option<usize> {
        self.slots.as_ref().map(|s| s.available_permits())
    }
}

#[async_trait]
impl Substrate for BlockingPool {
    fn submit<T, E>(&self, task: TaskRef<T, E>, attempt: u32) -> AttemptHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let (sender, handle) = AttemptHandle::channel(attempt, task.name());

        let Some(slots) = self.slots.clone() else {
            tokio::task::spawn_blocking(move || sender.run(&*task));
            return handle;
        };

        let token = sender.token().clone();
        tokio::spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                permit = slots.acquire_owned() => permit,
            };
            // The semaphore is never closed; a closed one would simply drop the attempt.
            let Ok(permit) = permit else { return };
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                sender.run(&*task);
            });
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::handle::AttemptOutcome;
    use crate::tasks::TaskFn;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..1000 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached within 1s");
    }

    fn holder() -> TaskRef<u32, Infallible> {
        TaskFn::arc("holder", |ctx: CancellationToken| {
            while !ctx.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok::<u32, Infallible>(0)
        })
    }

    fn counted(calls: Arc<AtomicU32>) -> TaskRef<u32, Infallible> {
        TaskFn::arc("counted", move |_ctx: CancellationToken| {
            Ok::<u32, Infallible>(calls.fetch_add(1, Ordering::SeqCst) + 1)
        })
    }

    #[tokio::test]
    async fn test_unbounded_runs_immediately() {
        let pool = BlockingPool::unbounded();
        assert_eq!(pool.available_slots(), None);

        let calls = Arc::new(AtomicU32::new(0));
        let mut handle = pool.submit(counted(Arc::clone(&calls)), 1);
        let out = pool
            .await_result(&mut handle, Duration::from_secs(1), &CancellationToken::new())
            .await;

        assert!(matches!(out, AttemptOutcome::Success(1)));
        assert_eq!(handle.attempt(), 1);
    }

    #[tokio::test]
    async fn test_bounded_pool_queues_until_slot_is_released() {
        let pool = BlockingPool::bounded(1);
        let never = CancellationToken::new();

        let first = pool.submit(holder(), 1);
        wait_until(|| pool.available_slots() == Some(0)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let mut second = pool.submit(counted(Arc::clone(&calls)), 1);
        let out = pool
            .await_result(&mut second, Duration::from_millis(20), &never)
            .await;
        assert!(matches!(out, AttemptOutcome::TimedOut));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        pool.request_cancel(&first);
        assert!(first.is_cancelled());

        let out = pool
            .await_result(&mut second, Duration::from_secs(1), &never)
            .await;
        assert!(matches!(out, AttemptOutcome::Success(1)));
        wait_until(|| pool.available_slots() == Some(1)).await;
    }

    #[tokio::test]
    async fn test_cancelled_while_queued_never_runs() {
        let pool = BlockingPool::bounded(1);
        let never = CancellationToken::new();

        let first = pool.submit(holder(), 1);
        wait_until(|| pool.available_slots() == Some(0)).await;

        let calls = Arc::new(AtomicU32::new(0));
        let mut queued = pool.submit(counted(Arc::clone(&calls)), 1);
        pool.request_cancel(&queued);

        let out = pool
            .await_result(&mut queued, Duration::from_secs(1), &never)
            .await;
        assert!(matches!(out, AttemptOutcome::Interrupted));

        pool.request_cancel(&first);
        wait_until(|| pool.available_slots() == Some(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_bound_is_unbounded() {
        assert_eq!(BlockingPool::bounded(0).available_slots(), None);
        assert_eq!(BlockingPool::bounded(3).available_slots(), Some(3));
    }
}
