//! Error types used by the engine and its configuration.
//!
//! This module defines two error enums:
//!
//! - [`ConfigError`] - an out-of-range value was given while building a budget or engine.
//! - [`ExecuteError`] - an execution ended without producing a value.
//!
//! Both provide `as_label` for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Invalid configuration values.
///
/// Raised synchronously by [`WaitBudget`](crate::WaitBudget) constructors and
/// [`EngineBuilder::build`](crate::EngineBuilder::build), never during execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Wait magnitude below zero.
    #[error("invalid argument: wait magnitude must be non-negative, got {magnitude}")]
    NegativeWait {
        /// The rejected magnitude.
        magnitude: f64,
    },

    /// Wait magnitude is NaN or infinite.
    #[error("invalid argument: wait magnitude must be finite, got {magnitude}")]
    NonFiniteWait {
        /// The rejected magnitude.
        magnitude: f64,
    },

    /// Backoff factor below `1.0` or not finite.
    #[error("invalid argument: backoff factor must be finite and >= 1.0, got {factor}")]
    InvalidBackoffFactor {
        /// The rejected factor.
        factor: f64,
    },

    /// `max_attempts` was zero.
    #[error("invalid argument: at least one attempt is required")]
    ZeroAttempts,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskbound::ConfigError;
    ///
    /// let err = ConfigError::NegativeWait { magnitude: -1.0 };
    /// assert_eq!(err.as_label(), "config_negative_wait");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NegativeWait { .. } => "config_negative_wait",
            ConfigError::NonFiniteWait { .. } => "config_non_finite_wait",
            ConfigError::InvalidBackoffFactor { .. } => "config_invalid_backoff_factor",
            ConfigError::ZeroAttempts => "config_zero_attempts",
        }
    }
}

/// # Errors produced by [`Engine::execute`](crate::Engine::execute).
///
/// Only timeouts are retried by the engine. Every variant here is terminal:
/// - [`ExecuteError::Task`] carries the task's own error value, untouched;
/// - [`ExecuteError::Panicked`] the task panicked instead of returning;
/// - [`ExecuteError::Interrupted`] the caller's interruption signal fired;
/// - [`ExecuteError::DeadlineExceeded`] every permitted attempt timed out.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExecuteError<E> {
    /// The task ran and returned an error.
    #[error("task failed: {0}")]
    Task(E),

    /// The task panicked.
    #[error("task panicked: {reason}")]
    Panicked {
        /// Panic payload rendered as text.
        reason: String,
    },

    /// The caller was interrupted while waiting for an attempt.
    #[error("interrupted while waiting for task")]
    Interrupted,

    /// All attempts timed out.
    #[error("deadline exceeded after {attempts} attempt(s); last wait {last_wait:?}")]
    DeadlineExceeded {
        /// Number of attempts made.
        attempts: u32,
        /// Budget of the final attempt.
        last_wait: Duration,
    },
}

impl<E> ExecuteError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use taskbound::ExecuteError;
    ///
    /// let err: ExecuteError<std::io::Error> = ExecuteError::DeadlineExceeded {
    ///     attempts: 3,
    ///     last_wait: Duration::from_millis(40),
    /// };
    /// assert_eq!(err.as_label(), "execute_deadline_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecuteError::Task(_) => "execute_task_failed",
            ExecuteError::Panicked { .. } => "execute_task_panicked",
            ExecuteError::Interrupted => "execute_interrupted",
            ExecuteError::DeadlineExceeded { .. } => "execute_deadline_exceeded",
        }
    }

    /// Borrows the task's own error, if that is what ended the execution.
    pub fn task_error(&self) -> Option<&E> {
        match self {
            ExecuteError::Task(e) => Some(e),
            _ => None,
        }
    }

    /// Extracts the task's own error, if that is what ended the execution.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            ExecuteError::Task(e) => Some(e),
            _ => None,
        }
    }

    /// `true` if every permitted attempt timed out.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ExecuteError::DeadlineExceeded { .. })
    }

    /// `true` if the caller's interruption signal ended the execution.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ExecuteError::Interrupted)
    }
}
