//! Isolated task runner.
//!
//! ## Contents
//! - [`Substrate`] collaborator trait: submit / await / cancel
//! - [`AttemptHandle`], [`AttemptSender`] the two halves of one in-flight attempt
//! - [`AttemptOutcome`] classified result of waiting on an attempt
//! - [`BlockingPool`] default substrate on Tokio's blocking thread pool

mod handle;
mod pool;
#[allow(clippy::module_inception)]
mod substrate;

pub use handle::{AttemptHandle, AttemptOutcome, AttemptResult, AttemptSender};
pub use pool::BlockingPool;
pub use substrate::Substrate;
