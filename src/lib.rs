//! # taskbound
//!
//! **Taskbound** runs blocking units of work with a time budget per attempt and retries
//! attempts that run out of time.
//!
//! Each attempt runs in isolation on an execution substrate (a worker thread by
//! default), so the caller only ever waits, never executes. An attempt that outlives its
//! budget is asked to stop and the next one gets a budget grown by a backoff factor.
//! Task errors, panics and caller interruptions end the execution at once.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   execute()  │   │   execute()  │   │   execute()  │
//!     │ (caller #1)  │   │ (caller #2)  │   │ (caller #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Engine (cloneable, no per-call state)                            │
//! │  - EngineConfig (attempts, initial wait, backoff factor)          │
//! │  - Substrate (BlockingPool by default, optionally bounded)        │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ attempt loop │   │ attempt loop │   │ attempt loop │   │
//!     │ + WaitBudget │   │ + WaitBudget │   │ + WaitBudget │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - AttemptStarting│                  │                 │
//!      │ - TimeoutHit     │                  │                 │
//!      │ - BackoffSched.  │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: EngineConfig::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                     sub1.on    sub2.on    subN.on
//!                     _event()   _event()   _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! budget := WaitBudget from EngineConfig (or the caller's)
//!
//! for attempt in 1..=max_attempts {
//!   ├─► caller interrupted? ─► Interrupted
//!   ├─► publish AttemptStarting{ task, attempt, wait }
//!   ├─► substrate.submit(task) ─► await_result(wait, interrupt)
//!   │       ├─ Success     ─► return value
//!   │       ├─ Failed(e)   ─► ExecuteError::Task(e)
//!   │       ├─ Panicked    ─► ExecuteError::Panicked
//!   │       ├─ Interrupted ─► request_cancel, ExecuteError::Interrupted
//!   │       └─ TimedOut    ─► request_cancel
//!   │                          ├─ last attempt ─► ExecuteError::DeadlineExceeded
//!   │                          └─ budget.advance(), publish BackoffScheduled
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Budgets**       | Per-attempt wait with multiplicative backoff.                 | [`WaitBudget`], [`TimeUnit`]                |
//! | **Execution**     | Isolated attempts with submit / await / cancel.               | [`Substrate`], [`BlockingPool`]             |
//! | **Retry engine**  | Bounded attempts, timeouts only are retried.                  | [`Engine`], [`EngineBuilder`]               |
//! | **Tasks**         | Blocking closures with a cooperative cancellation token.      | [`Task`], [`TaskFn`], [`TaskRef`]           |
//! | **Subscriber API**| Hook into attempt lifecycle events (logging, metrics, ...).   | [`Subscribe`]                               |
//! | **Errors**        | Typed construction and execution errors.                      | [`ConfigError`], [`ExecuteError`]           |
//! | **Configuration** | Centralize engine settings.                                   | [`EngineConfig`]                            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use taskbound::{Engine, ExecuteError, TaskFn, TaskRef, TimeUnit};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskbound::Subscribe>> = {
//!         use taskbound::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskbound::Subscribe>> = Vec::new();
//!
//!     // Three attempts: 50ms, then 100ms, then 200ms
//!     let engine = Engine::builder()
//!         .max_attempts(3)
//!         .wait(50.0, TimeUnit::Milliseconds)
//!         .backoff_factor(2.0)
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     // A task that never finishes on its own, but honours cancellation
//!     let stuck: TaskRef<(), String> = TaskFn::arc("stuck", |ctx: CancellationToken| {
//!         while !ctx.is_cancelled() {
//!             std::thread::sleep(std::time::Duration::from_millis(1));
//!         }
//!         Ok::<(), String>(())
//!     });
//!
//!     match engine.execute(stuck).await {
//!         Err(ExecuteError::DeadlineExceeded { attempts, .. }) => assert_eq!(attempts, 3),
//!         other => panic!("unexpected: {other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
mod budget;
mod core;
mod error;
mod events;
mod subscribers;
mod substrate;
mod tasks;

// ---- Public re-exports ----

pub use budget::{TimeUnit, WaitBudget};
pub use core::{Engine, EngineBuilder, EngineConfig};
pub use error::{ConfigError, ExecuteError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use substrate::{AttemptHandle, AttemptOutcome, AttemptResult, AttemptSender, BlockingPool, Substrate};
pub use tasks::{Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
