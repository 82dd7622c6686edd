//! # Engine configuration.
//!
//! Provides [`EngineConfig`] centralized settings captured when an [`Engine`](crate::Engine)
//! is built. The configuration is immutable afterwards.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unbounded default pool (no slot semaphore created)
//! - `bus_capacity = 0`   → clamped to 1

use crate::budget::{TimeUnit, WaitBudget, check_backoff_factor, check_magnitude};
use crate::error::ConfigError;

/// Configuration for the bounded retry engine.
///
/// ## Field semantics
/// - `max_attempts`: total attempts per execution, including the first (`>= 1`)
/// - `wait` / `unit`: budget of the first attempt
/// - `backoff_factor`: budget multiplier between timed-out attempts (`>= 1.0`)
/// - `max_concurrent`: slot limit of the default [`BlockingPool`](crate::BlockingPool) (`0` = unbounded)
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Total attempts per execution (first attempt included).
    pub max_attempts: u32,

    /// Wait magnitude of the first attempt, in `unit`.
    pub wait: f64,

    /// Unit of `wait`.
    pub unit: TimeUnit,

    /// Multiplier applied to the wait after every timed-out attempt that is retried.
    ///
    /// - `1.0` = fixed budget
    /// - `> 1.0` = exponential growth
    pub backoff_factor: f64,

    /// Maximum number of attempts the default pool runs at once.
    ///
    /// Ignored when a custom substrate is supplied to the builder.
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl EngineConfig {
    /// Checks every field against its allowed range.
    ///
    /// # Errors
    /// Returns the first out-of-range value found as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        check_magnitude(self.wait)?;
        check_backoff_factor(self.backoff_factor)
    }

    /// Builds a fresh [`WaitBudget`] from `wait`, `unit` and `backoff_factor`.
    ///
    /// # Errors
    /// Same as [`WaitBudget::with_backoff`].
    pub fn budget(&self) -> Result<WaitBudget, ConfigError> {
        WaitBudget::with_backoff(self.wait, self.unit, self.backoff_factor)
    }

    /// Returns the default pool's slot limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` concurrent attempts
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `max_attempts = 1` (no retries)
    /// - `wait = 30 seconds`
    /// - `backoff_factor = 1.0` (fixed budget)
    /// - `max_concurrent = 0` (unbounded)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_attempts: 1,
            wait: 30.0,
            unit: TimeUnit::Seconds,
            backoff_factor: 1.0,
            max_concurrent: 0,
            bus_capacity: 1024,
        }
    }
}
