//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Result<T, E>` and calls it
//! once per attempt. The closure is `Fn`, not `FnMut`: state that must survive between
//! attempts (an attempt counter, a connection pool) is captured explicitly, e.g. in an `Arc`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use tokio_util::sync::CancellationToken;
//! use taskbound::{TaskFn, TaskRef};
//!
//! let calls = Arc::new(AtomicU32::new(0));
//! let seen = Arc::clone(&calls);
//! let t: TaskRef<u32, std::io::Error> = TaskFn::arc("counter", move |_ctx: CancellationToken| {
//!     Ok::<_, std::io::Error>(seen.fetch_add(1, Ordering::SeqCst) + 1)
//! });
//!
//! assert_eq!(t.name(), "counter");
//! assert_eq!(t.run(CancellationToken::new()).unwrap(), 1);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::tasks::task::Task;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task and returns it in an `Arc`, ready to coerce into a `TaskRef`.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, T, E> Task<T, E> for TaskFn<F>
where
    F: Fn(CancellationToken) -> Result<T, E> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: CancellationToken) -> Result<T, E> {
        (self.f)(ctx)
    }
}
