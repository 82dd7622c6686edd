//! # Wait budget for bounded attempts.
//!
//! [`WaitBudget`] holds the time allowance of a single attempt and how it grows
//! after an attempt times out. It is parameterized by:
//! - the initial magnitude and its [`TimeUnit`];
//! - [`WaitBudget::backoff_factor`] the multiplicative growth factor (`1.0` = constant).
//!
//! The budget is owned by one execution at a time and mutated in place:
//! [`advance`](WaitBudget::advance) after a timed-out attempt, [`reset`](WaitBudget::reset)
//! to start over.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskbound::{TimeUnit, WaitBudget};
//!
//! let mut budget = WaitBudget::with_backoff(2.0, TimeUnit::Milliseconds, 2.0)?;
//! assert_eq!(budget.advance(), 4.0);
//! assert_eq!(budget.advance(), 8.0);
//! assert_eq!(budget.duration(), Duration::from_millis(8));
//!
//! budget.reset();
//! assert_eq!(budget.current(), 2.0);
//! # Ok::<(), taskbound::ConfigError>(())
//! ```

use std::time::Duration;

use crate::budget::time_unit::TimeUnit;
use crate::error::ConfigError;

/// Mutable per-attempt time allowance with multiplicative backoff.
#[derive(Clone, Debug, PartialEq)]
pub struct WaitBudget {
    initial: f64,
    current: f64,
    unit: TimeUnit,
    backoff_factor: f64,
}

impl WaitBudget {
    /// Creates a constant budget (`backoff_factor = 1.0`).
    ///
    /// # Errors
    /// Returns an error if `magnitude` is negative or not finite.
    pub fn new(magnitude: f64, unit: TimeUnit) -> Result<Self, ConfigError> {
        Self::with_backoff(magnitude, unit, 1.0)
    }

    /// Creates a budget that is multiplied by `backoff_factor` on every [`advance`](Self::advance).
    ///
    /// # Errors
    /// - [`ConfigError::NegativeWait`] if `magnitude < 0`;
    /// - [`ConfigError::NonFiniteWait`] if `magnitude` is NaN or infinite;
    /// - [`ConfigError::InvalidBackoffFactor`] if `backoff_factor` is below `1.0` or not finite.
    pub fn with_backoff(
        magnitude: f64,
        unit: TimeUnit,
        backoff_factor: f64,
    ) -> Result<Self, ConfigError> {
        check_magnitude(magnitude)?;
        check_backoff_factor(backoff_factor)?;
        Ok(Self {
            initial: magnitude,
            current: magnitude,
            unit,
            backoff_factor,
        })
    }

    /// Current magnitude in the configured unit.
    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Current magnitude converted to `target`.
    ///
    /// The magnitude is first truncated to a whole amount of the configured unit,
    /// then converted with [`TimeUnit::convert`].
    pub fn current_in(&self, target: TimeUnit) -> f64 {
        target.convert(self.whole_units(), self.unit) as f64
    }

    /// Per-attempt timeout for the current magnitude.
    pub fn duration(&self) -> Duration {
        self.unit.to_duration(self.whole_units())
    }

    /// Applies the backoff factor and returns the new magnitude.
    ///
    /// Saturates at `f64::MAX`; with a factor of `1.0` the value never changes.
    pub fn advance(&mut self) -> f64 {
        self.current = (self.current * self.backoff_factor).min(f64::MAX);
        self.current
    }

    /// Restores the magnitude given at construction time.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    /// Magnitude given at construction time.
    #[inline]
    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Unit the magnitude is expressed in.
    #[inline]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    #[inline]
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    // `as` saturates for out-of-range floats; `current` is finite and non-negative.
    fn whole_units(&self) -> u64 {
        self.current as u64
    }
}

pub(crate) fn check_magnitude(magnitude: f64) -> Result<(), ConfigError> {
    if !magnitude.is_finite() {
        return Err(ConfigError::NonFiniteWait { magnitude });
    }
    if magnitude < 0.0 {
        return Err(ConfigError::NegativeWait { magnitude });
    }
    Ok(())
}

pub(crate) fn check_backoff_factor(factor: f64) -> Result<(), ConfigError> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(ConfigError::InvalidBackoffFactor { factor });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_magnitude_rejected() {
        for magnitude in [-1.0, -0.001, -1e9] {
            let err = WaitBudget::new(magnitude, TimeUnit::Milliseconds).unwrap_err();
            assert_eq!(err, ConfigError::NegativeWait { magnitude });
        }
    }

    #[test]
    fn test_non_finite_magnitude_rejected() {
        assert!(matches!(
            WaitBudget::new(f64::INFINITY, TimeUnit::Seconds),
            Err(ConfigError::NonFiniteWait { .. })
        ));
        assert!(matches!(
            WaitBudget::new(f64::NAN, TimeUnit::Seconds),
            Err(ConfigError::NonFiniteWait { .. })
        ));
    }

    #[test]
    fn test_backoff_factor_below_one_rejected() {
        assert!(matches!(
            WaitBudget::with_backoff(5.0, TimeUnit::Milliseconds, 0.5),
            Err(ConfigError::InvalidBackoffFactor { .. })
        ));
    }

    #[test]
    fn test_zero_magnitude_allowed() {
        let budget = WaitBudget::new(0.0, TimeUnit::Seconds).unwrap();
        assert_eq!(budget.duration(), Duration::ZERO);
    }

    #[test]
    fn test_unit_conversion() {
        let budget = WaitBudget::new(2.0, TimeUnit::Milliseconds).unwrap();
        assert_eq!(budget.current(), 2.0);
        assert_eq!(budget.current_in(TimeUnit::Microseconds), 2000.0);
        assert_eq!(budget.unit(), TimeUnit::Milliseconds);
    }

    #[test]
    fn test_unit_conversion_truncates_fraction() {
        let budget = WaitBudget::new(2.7, TimeUnit::Milliseconds).unwrap();
        assert_eq!(budget.current_in(TimeUnit::Microseconds), 2000.0);
        assert_eq!(budget.duration(), Duration::from_millis(2));
    }

    #[test]
    fn test_constant_factor_advance_is_noop() {
        let mut budget = WaitBudget::new(2.0, TimeUnit::Milliseconds).unwrap();
        for _ in 0..10 {
            assert_eq!(budget.advance(), 2.0);
        }
        assert_eq!(budget.current(), 2.0);
    }

    #[test]
    fn test_exponential_advance_and_reset() {
        let mut budget = WaitBudget::with_backoff(2.0, TimeUnit::Milliseconds, 2.0).unwrap();
        assert_eq!(budget.current(), 2.0);
        budget.advance();
        assert_eq!(budget.current(), 4.0);
        budget.advance();
        assert_eq!(budget.current(), 8.0);

        budget.reset();
        assert_eq!(budget.current(), 2.0);
        assert_eq!(budget.initial(), 2.0);
    }

    #[test]
    fn test_fractional_factor_truncates_duration() {
        let mut budget = WaitBudget::with_backoff(5.0, TimeUnit::Milliseconds, 1.5).unwrap();
        budget.advance();
        assert_eq!(budget.current(), 7.5);
        assert_eq!(budget.duration(), Duration::from_millis(7));
    }

    #[test]
    fn test_advance_saturates() {
        let mut budget = WaitBudget::with_backoff(f64::MAX, TimeUnit::Days, 10.0).unwrap();
        assert_eq!(budget.advance(), f64::MAX);
        assert_eq!(budget.duration(), Duration::MAX);
    }
}
