//! # Engine: bounded retry over an isolated substrate.
//!
//! [`Engine`] runs a [`Task`](crate::Task) on its [`Substrate`], bounding every attempt by
//! a [`WaitBudget`]. Only timed-out attempts are retried; each retry gets the budget
//! multiplied by the backoff factor.
//!
//! ## Architecture
//! ```text
//! execute(task)
//!   ├─► budget := EngineConfig::budget()   (or the caller's, see execute_with_budget)
//!   └─► for attempt in 1..=max_attempts
//!         ├─► interrupted already?  ──► Interrupted
//!         ├─► run_attempt(wait = budget.duration())
//!         │     ├─ Success(v)     ──► Ok(v)
//!         │     ├─ Failed(e)      ──► Task(e)
//!         │     ├─ Panicked       ──► Panicked
//!         │     ├─ Interrupted    ──► Interrupted         (attempt cancelled)
//!         │     └─ TimedOut                                (attempt cancelled)
//!         │           ├─ last attempt ──► DeadlineExceeded
//!         │           └─ otherwise    ──► budget.advance(), BackoffScheduled
//!         └─► next attempt
//! ```
//!
//! ## Rules
//! - Attempts of one execution are **strictly sequential**; the engine never waits for a
//!   cancelled attempt to stop before submitting the next one.
//! - There is no sleep between attempts; "backoff" grows the wait, not a delay.
//! - The engine holds no per-execution state, so clones and concurrent calls are independent.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    budget::WaitBudget,
    core::{builder::EngineBuilder, config::EngineConfig, runner::run_attempt},
    error::ExecuteError,
    events::{Bus, Event, EventKind},
    substrate::{AttemptOutcome, BlockingPool, Substrate},
    tasks::TaskRef,
};

/// Bounded-time task execution engine with retry.
///
/// Build one with [`Engine::builder`]. Cloning is cheap and clones share the substrate,
/// the event bus and the subscriber listener.
///
/// # Example
/// ```
/// use std::convert::Infallible;
/// use taskbound::{Engine, TaskFn, TimeUnit};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let engine = Engine::builder()
///         .retries(2)
///         .wait(200.0, TimeUnit::Milliseconds)
///         .backoff_factor(2.0)
///         .build()
///         .unwrap();
///
///     let task = TaskFn::arc("answer", |_ctx: CancellationToken| Ok::<u32, Infallible>(42));
///     assert_eq!(engine.execute(task).await.unwrap(), 42);
/// }
/// ```
pub struct Engine<S = BlockingPool> {
    cfg: EngineConfig,
    budget: WaitBudget,
    substrate: Arc<S>,
    bus: Bus,
    _listener: Option<Arc<DropGuard>>,
}

impl<S> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            cfg: self.cfg.clone(),
            budget: self.budget.clone(),
            substrate: Arc::clone(&self.substrate),
            bus: self.bus.clone(),
            _listener: self._listener.clone(),
        }
    }
}

impl Engine<BlockingPool> {
    /// Builder starting from [`EngineConfig::default`].
    pub fn builder() -> EngineBuilder<BlockingPool> {
        EngineBuilder::new(EngineConfig::default())
    }

    /// Builder starting from `cfg`.
    pub fn builder_with(cfg: EngineConfig) -> EngineBuilder<BlockingPool> {
        EngineBuilder::new(cfg)
    }
}

impl<S: Substrate> Engine<S> {
    pub(crate) fn new_internal(
        cfg: EngineConfig,
        budget: WaitBudget,
        substrate: Arc<S>,
        bus: Bus,
        listener: Option<DropGuard>,
    ) -> Self {
        Self {
            cfg,
            budget,
            substrate,
            bus,
            _listener: listener.map(Arc::new),
        }
    }

    /// Runs `task` with a fresh budget from the configuration; never interrupted.
    ///
    /// # Errors
    /// See [`ExecuteError`]; without an interruption signal `Interrupted` only shows up
    /// if the substrate dropped an attempt.
    pub async fn execute<T, E>(&self, task: TaskRef<T, E>) -> Result<T, ExecuteError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        self.execute_interruptible(task, &CancellationToken::new())
            .await
    }

    /// Runs `task` with a fresh budget from the configuration.
    ///
    /// Cancelling `interrupt` stops the execution at once with
    /// [`ExecuteError::Interrupted`] and requests cancellation of the in-flight attempt.
    pub async fn execute_interruptible<T, E>(
        &self,
        task: TaskRef<T, E>,
        interrupt: &CancellationToken,
    ) -> Result<T, ExecuteError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let mut budget = self.budget.clone();
        self.execute_with_budget(task, &mut budget, interrupt).await
    }

    /// Runs `task` bounded by the caller's `budget`.
    ///
    /// The budget is advanced in place after every timed-out attempt that is retried and
    /// is never reset, so the caller can observe the final wait or carry it forward.
    pub async fn execute_with_budget<T, E>(
        &self,
        task: TaskRef<T, E>,
        budget: &mut WaitBudget,
        interrupt: &CancellationToken,
    ) -> Result<T, ExecuteError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let name: Arc<str> = Arc::from(task.name());
        let max_attempts = self.cfg.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if interrupt.is_cancelled() {
                self.publish_interrupted(&name, attempt);
                return Err(ExecuteError::Interrupted);
            }

            let wait = budget.duration();
            let outcome = run_attempt(
                &*self.substrate,
                &task,
                &name,
                attempt,
                wait,
                interrupt,
                &self.bus,
            )
            .await;

            if outcome.is_retryable() && attempt < max_attempts {
                budget.advance();
                self.bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_task(Arc::clone(&name))
                        .with_attempt(attempt)
                        .with_wait(budget.duration()),
                );
                continue;
            }

            return match outcome {
                AttemptOutcome::Success(value) => Ok(value),
                AttemptOutcome::Failed(err) => Err(ExecuteError::Task(err)),
                AttemptOutcome::Panicked { reason } => Err(ExecuteError::Panicked { reason }),
                AttemptOutcome::Interrupted => {
                    self.publish_interrupted(&name, attempt);
                    Err(ExecuteError::Interrupted)
                }
                AttemptOutcome::TimedOut => {
                    self.bus.publish(
                        Event::new(EventKind::DeadlineExceeded)
                            .with_task(Arc::clone(&name))
                            .with_attempt(attempt)
                            .with_wait(wait),
                    );
                    Err(ExecuteError::DeadlineExceeded {
                        attempts: attempt,
                        last_wait: wait,
                    })
                }
            };
        }
    }

    /// Receiver for every event this engine (and its clones) publishes from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    #[inline]
    pub fn substrate(&self) -> &Arc<S> {
        &self.substrate
    }

    fn publish_interrupted(&self, name: &Arc<str>, attempt: u32) {
        self.bus.publish(
            Event::new(EventKind::Interrupted)
                .with_task(Arc::clone(name))
                .with_attempt(attempt),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::TimeUnit;
    use crate::substrate::AttemptHandle;
    use crate::tasks::TaskFn;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn engine(max_attempts: u32, wait_ms: f64, factor: f64) -> Engine {
        Engine::builder()
            .max_attempts(max_attempts)
            .wait(wait_ms, TimeUnit::Milliseconds)
            .backoff_factor(factor)
            .build()
            .expect("valid config")
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn count(events: &[Event], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }

    /// Blocks until cancelled, then returns `Ok(0)`.
    fn sleeper(calls: Arc<AtomicU32>) -> TaskRef<u32, String> {
        TaskFn::arc("sleeper", move |ctx: CancellationToken| {
            calls.fetch_add(1, Ordering::SeqCst);
            while !ctx.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok::<u32, String>(0)
        })
    }

    #[tokio::test]
    async fn test_success_within_budget() {
        let engine = engine(3, 1000.0, 2.0);
        let mut rx = engine.subscribe();

        let task = TaskFn::arc("quick", |_ctx: CancellationToken| Ok::<&str, String>("done"));
        assert_eq!(engine.execute(task).await.unwrap(), "done");

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::AttemptStarting), 1);
        assert_eq!(count(&events, EventKind::AttemptSucceeded), 1);
        assert_eq!(count(&events, EventKind::BackoffScheduled), 0);
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[tokio::test]
    async fn test_exhausted_budget_reports_deadline_exceeded() {
        let engine = engine(3, 20.0, 2.0);
        let mut rx = engine.subscribe();
        let calls = Arc::new(AtomicU32::new(0));

        let err = engine
            .execute(sleeper(Arc::clone(&calls)))
            .await
            .unwrap_err();
        match err {
            ExecuteError::DeadlineExceeded {
                attempts,
                last_wait,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_wait, Duration::from_millis(80));
            }
            other => panic!("unexpected error: {}", other.as_label()),
        }

        let events = drain(&mut rx);
        let waits: Vec<u32> = events
            .iter()
            .filter(|e| e.kind == EventKind::BackoffScheduled)
            .filter_map(|e| e.wait_ms)
            .collect();
        assert_eq!(waits, vec![40, 80]);
        assert_eq!(count(&events, EventKind::TimeoutHit), 3);
        assert_eq!(count(&events, EventKind::CancelRequested), 3);
        assert_eq!(count(&events, EventKind::DeadlineExceeded), 1);
        assert!(events.last().is_some_and(Event::is_terminal));
    }

    #[tokio::test]
    async fn test_later_attempt_succeeds() {
        let engine = engine(3, 30.0, 2.0);
        let mut rx = engine.subscribe();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let task = TaskFn::arc("flaky", move |ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                while !ctx.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
            }
            Ok::<u32, String>(n)
        });

        assert_eq!(engine.execute(task).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::TimeoutHit), 1);
        assert_eq!(count(&events, EventKind::BackoffScheduled), 1);
        assert_eq!(count(&events, EventKind::AttemptSucceeded), 1);
    }

    #[tokio::test]
    async fn test_task_error_is_not_retried() {
        let engine = engine(5, 1000.0, 1.0);
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let task = TaskFn::arc("fails", move |_ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, String>("bad input".to_string())
        });

        let err = engine.execute(task).await.unwrap_err();
        assert_eq!(err.task_error().map(String::as_str), Some("bad input"));
        assert_eq!(err.into_task_error(), Some("bad input".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panic_is_not_retried() {
        let engine = engine(5, 1000.0, 1.0);
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let task = TaskFn::arc("panics", move |_ctx: CancellationToken| -> Result<u32, String> {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("kaboom")
        });

        match engine.execute(task).await {
            Err(ExecuteError::Panicked { reason }) => assert_eq!(reason, "kaboom"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interrupt_while_waiting() {
        let engine = engine(3, 10_000.0, 1.0);
        let interrupt = CancellationToken::new();
        let seen_cancel = Arc::new(AtomicU32::new(0));

        let seen = Arc::clone(&seen_cancel);
        let task = TaskFn::arc("long", move |ctx: CancellationToken| {
            while !ctx.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            seen.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, String>(0)
        });

        let trigger = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = engine
            .execute_interruptible(task, &interrupt)
            .await
            .unwrap_err();
        assert!(err.is_interrupted());
        assert!(started.elapsed() < Duration::from_secs(5));

        for _ in 0..1000 {
            if seen_cancel.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(seen_cancel.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interrupted_before_first_attempt() {
        let engine = engine(3, 1000.0, 1.0);
        let mut rx = engine.subscribe();
        let interrupt = CancellationToken::new();
        interrupt.cancel();

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let task = TaskFn::arc("never", move |_ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, String>(1)
        });

        let err = engine
            .execute_interruptible(task, &interrupt)
            .await
            .unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::AttemptStarting), 0);
        assert_eq!(count(&events, EventKind::Interrupted), 1);
    }

    #[tokio::test]
    async fn test_caller_budget_is_advanced_in_place() {
        let engine = engine(3, 1000.0, 1.0);
        let mut budget = WaitBudget::with_backoff(10.0, TimeUnit::Milliseconds, 2.0).unwrap();
        let calls = Arc::new(AtomicU32::new(0));

        let err = engine
            .execute_with_budget(sleeper(Arc::clone(&calls)), &mut budget, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_deadline_exceeded());
        assert_eq!(budget.current(), 40.0);
        assert_eq!(budget.initial(), 10.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_executions_are_independent() {
        let engine = engine(2, 1000.0, 1.0);

        let mut joins = Vec::new();
        for i in 0..8u32 {
            let engine = engine.clone();
            joins.push(tokio::spawn(async move {
                let task = TaskFn::arc("square", move |_ctx: CancellationToken| {
                    std::thread::sleep(Duration::from_millis(5));
                    Ok::<u32, String>(i * i)
                });
                engine.execute(task).await
            }));
        }

        for (i, join) in joins.into_iter().enumerate() {
            let i = i as u32;
            assert_eq!(join.await.unwrap().unwrap(), i * i);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_budgets_do_not_interfere() {
        let engine = engine(3, 20.0, 2.0);

        let slow_calls = Arc::new(AtomicU32::new(0));
        let slow = {
            let engine = engine.clone();
            let task = sleeper(Arc::clone(&slow_calls));
            tokio::spawn(async move { engine.execute(task).await })
        };

        let mut fast = Vec::new();
        for i in 0..5u32 {
            let engine = engine.clone();
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let task = TaskFn::arc("second-try", move |ctx: CancellationToken| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    while !ctx.is_cancelled() {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    return Err::<u32, String>("abandoned".to_string());
                }
                Ok(i)
            });
            fast.push((i, calls, tokio::spawn(async move { engine.execute(task).await })));
        }

        match slow.await.unwrap() {
            Err(ExecuteError::DeadlineExceeded {
                attempts,
                last_wait,
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_wait, Duration::from_millis(80));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(slow_calls.load(Ordering::SeqCst), 3);

        for (i, calls, join) in fast {
            assert_eq!(join.await.unwrap().unwrap(), i);
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test]
    async fn test_zero_budget_expires_immediately() {
        let engine = engine(2, 0.0, 2.0);
        let calls = Arc::new(AtomicU32::new(0));

        let err = engine
            .execute(sleeper(Arc::clone(&calls)))
            .await
            .unwrap_err();
        match err {
            ExecuteError::DeadlineExceeded {
                attempts,
                last_wait,
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_wait, Duration::ZERO);
            }
            other => panic!("unexpected error: {}", other.as_label()),
        }
    }

    #[tokio::test]
    async fn test_default_config_is_single_attempt() {
        let engine = Engine::builder()
            .wait(20.0, TimeUnit::Milliseconds)
            .build()
            .unwrap();
        let calls = Arc::new(AtomicU32::new(0));

        let err = engine
            .execute(sleeper(Arc::clone(&calls)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::DeadlineExceeded { attempts: 1, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Delegates to a [`BlockingPool`] and counts what the engine asks for.
    #[derive(Default)]
    struct RecordingSubstrate {
        inner: BlockingPool,
        submits: AtomicU32,
        cancels: AtomicU32,
    }

    #[async_trait]
    impl Substrate for RecordingSubstrate {
        fn submit<T, E>(&self, task: TaskRef<T, E>, attempt: u32) -> AttemptHandle<T, E>
        where
            T: Send + 'static,
            E: Send + 'static,
        {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.inner.submit(task, attempt)
        }

        fn request_cancel<T, E>(&self, handle: &AttemptHandle<T, E>) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.inner.request_cancel(handle);
        }
    }

    #[tokio::test]
    async fn test_custom_substrate_sees_submit_and_cancel() {
        let substrate = Arc::new(RecordingSubstrate::default());
        let engine = Engine::builder()
            .max_attempts(2)
            .wait(10.0, TimeUnit::Milliseconds)
            .with_substrate(Arc::clone(&substrate))
            .build()
            .unwrap();
        let calls = Arc::new(AtomicU32::new(0));

        let err = engine
            .execute(sleeper(Arc::clone(&calls)))
            .await
            .unwrap_err();
        assert!(err.is_deadline_exceeded());
        assert_eq!(substrate.submits.load(Ordering::SeqCst), 2);
        assert_eq!(substrate.cancels.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(engine.substrate(), &substrate));
    }
}
