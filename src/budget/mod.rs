//! Wait budgets and time units.
//!
//! ## Contents
//! - [`TimeUnit`]   granularity of a wait magnitude, with integer conversion
//! - [`WaitBudget`] per-attempt allowance that grows by a backoff factor
//!
//! ## Quick wiring
//! ```text
//! EngineConfig { wait, unit, backoff_factor }
//!      └─► EngineConfig::budget() ─► WaitBudget (one per execute() call)
//!           - duration() bounds each attempt
//!           - advance() between timed-out attempts
//! ```

mod time_unit;
mod wait;

pub use time_unit::TimeUnit;
pub use wait::WaitBudget;
pub(crate) use wait::{check_backoff_factor, check_magnitude};
