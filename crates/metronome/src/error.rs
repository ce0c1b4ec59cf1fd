//! Error types for pulse configuration
//!
//! Configuration problems surface synchronously at the constructing call;
//! values are never clamped into range behind the caller's back.

use chrono::Month;
use thiserror::Error;

/// Errors raised while turning caller configuration into a pulse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PulseError {
    /// Second constraint outside its natural domain.
    #[error("second {0} is outside 0..=59")]
    SecondOutOfRange(u32),

    /// Minute constraint outside its natural domain.
    #[error("minute {0} is outside 0..=59")]
    MinuteOutOfRange(u32),

    /// Hour constraint outside its natural domain.
    #[error("hour {0} is outside 0..=23")]
    HourOutOfRange(u32),

    /// Day-of-month constraint outside its natural domain.
    #[error("day of month {0} is outside 1..=31")]
    DayOfMonthOutOfRange(u32),

    /// Day-of-month and month constraints that no real date satisfies, such
    /// as February 30th.
    #[error("day {day} never occurs in {}", .month.name())]
    UnsatisfiableDayOfMonth {
        /// The requested day of the month.
        day: u32,
        /// The month that can never contain it.
        month: Month,
    },

    /// `take` called with a zero count.
    #[error("a pulse must beat at least once; take(0) is not a pulse")]
    ZeroTakeCount,
}

/// Convenience alias for pulse configuration results.
pub type PulseResult<T> = Result<T, PulseError>;

#[cfg(test)]
mod tests {
    //! Unit tests for error formatting.
    use super::*;

    /// Validates `PulseError` display output for the out-of-range scenarios.
    ///
    /// Assertions:
    /// - Confirms each rendered message names the offending value and domain.
    #[test]
    fn test_error_messages_name_value_and_domain() {
        assert_eq!(PulseError::SecondOutOfRange(61).to_string(), "second 61 is outside 0..=59");
        assert_eq!(PulseError::MinuteOutOfRange(99).to_string(), "minute 99 is outside 0..=59");
        assert_eq!(PulseError::HourOutOfRange(24).to_string(), "hour 24 is outside 0..=23");
        assert_eq!(
            PulseError::DayOfMonthOutOfRange(0).to_string(),
            "day of month 0 is outside 1..=31"
        );
    }

    /// Validates `PulseError` display output for the unsatisfiable date
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the message names both the day and the month.
    #[test]
    fn test_unsatisfiable_day_message_names_month() {
        let error = PulseError::UnsatisfiableDayOfMonth { day: 31, month: Month::February };

        assert_eq!(error.to_string(), "day 31 never occurs in February");
    }
}
