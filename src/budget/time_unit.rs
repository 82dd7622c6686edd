//! # Fixed-ratio time units.
//!
//! [`TimeUnit`] names the granularity a [`WaitBudget`](crate::WaitBudget) is expressed in.
//! Conversions between units use integer semantics:
//! - towards a **coarser** unit the amount is truncated (`1999µs → 1ms`);
//! - towards a **finer** unit the amount saturates at `u64::MAX` instead of overflowing.
//!
//! # Example
//! ```rust
//! use taskbound::TimeUnit;
//!
//! assert_eq!(TimeUnit::Microseconds.convert(2, TimeUnit::Milliseconds), 2_000);
//! assert_eq!(TimeUnit::Seconds.convert(1_999, TimeUnit::Milliseconds), 1);
//! ```

use std::fmt;
use std::time::Duration;

/// Unit of a wait magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in nanoseconds.
    #[inline]
    pub const fn as_nanos(self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 60 * 60 * 1_000_000_000,
            TimeUnit::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    /// Converts `amount` expressed in `from` into this unit.
    ///
    /// Truncates when `self` is coarser than `from`, saturates at `u64::MAX`
    /// when `self` is finer.
    pub fn convert(self, amount: u64, from: TimeUnit) -> u64 {
        let (src, dst) = (from.as_nanos(), self.as_nanos());
        if src >= dst {
            amount.saturating_mul(src / dst)
        } else {
            amount / (dst / src)
        }
    }

    /// Builds a [`Duration`] of `amount` units, saturating at [`Duration::MAX`].
    pub fn to_duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(amount),
            TimeUnit::Microseconds => Duration::from_micros(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
            coarse => {
                let secs_per_unit = coarse.as_nanos() / TimeUnit::Seconds.as_nanos();
                amount
                    .checked_mul(secs_per_unit)
                    .map(Duration::from_secs)
                    .unwrap_or(Duration::MAX)
            }
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "nanoseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
