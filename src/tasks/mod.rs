//! # Task abstractions.
//!
//! - [`Task`] - trait for blocking, cancelable units of work
//! - [`TaskFn`] - closure-backed implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task<T, E>>`)

mod task;
mod task_fn;

pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
