//! Calendar cadence configuration
//!
//! A [`Schedule`] names the wall-clock pattern a pulse should fire on: any
//! combination of a fixed second, minute, hour, day of month and month,
//! interpreted in a timezone (UTC unless set). Fields left unset are
//! unconstrained, so `Schedule::new().at_minute(0)` fires at the top of every
//! hour and an empty schedule fires every second.
//!
//! Values are validated when a pulse is built from the schedule, not when the
//! builder methods run.

use chrono::Month;
use chrono_tz::Tz;

use crate::calendar::FieldConstraints;
use crate::error::{PulseError, PulseResult};

/// Builder for a calendar-constrained firing pattern.
///
/// ```
/// use chrono::Month;
/// use chrono_tz::Europe::Berlin;
/// use metronome::Schedule;
///
/// // 06:30:00 Berlin time, every day in December.
/// let advent = Schedule::new()
///     .in_timezone(Berlin)
///     .at_hour(6)
///     .at_minute(30)
///     .at_second(0)
///     .in_month(Month::December);
/// assert_eq!(advent.hour(), Some(6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    timezone: Tz,
    second: Option<u32>,
    minute: Option<u32>,
    hour: Option<u32>,
    day_of_month: Option<u32>,
    month: Option<Month>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            second: None,
            minute: None,
            hour: None,
            day_of_month: None,
            month: None,
        }
    }
}

impl Schedule {
    /// An unconstrained schedule in UTC.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timezone the wall-clock fields are interpreted in.
    #[must_use]
    pub fn in_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Fires only at this second of the minute (0 to 59).
    #[must_use]
    pub fn at_second(mut self, second: u32) -> Self {
        self.second = Some(second);
        self
    }

    /// Fires only at this minute of the hour (0 to 59).
    #[must_use]
    pub fn at_minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }

    /// Fires only at this hour of the day (0 to 23).
    #[must_use]
    pub fn at_hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    /// Fires only on this day of the month (1 to 31).
    #[must_use]
    pub fn on_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    /// Fires only in this month.
    #[must_use]
    pub fn in_month(mut self, month: Month) -> Self {
        self.month = Some(month);
        self
    }

    /// The timezone the schedule is interpreted in.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The fixed second, if constrained.
    #[must_use]
    pub fn second(&self) -> Option<u32> {
        self.second
    }

    /// The fixed minute, if constrained.
    #[must_use]
    pub fn minute(&self) -> Option<u32> {
        self.minute
    }

    /// The fixed hour, if constrained.
    #[must_use]
    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    /// The fixed day of month, if constrained.
    #[must_use]
    pub fn day_of_month(&self) -> Option<u32> {
        self.day_of_month
    }

    /// The fixed month, if constrained.
    #[must_use]
    pub fn month(&self) -> Option<Month> {
        self.month
    }

    /// Validates the configured values and lowers them to field ranges.
    ///
    /// Out-of-domain values and a day/month pair no real date satisfies are
    /// configuration errors; nothing is clamped.
    pub(crate) fn field_constraints(&self) -> PulseResult<FieldConstraints> {
        let mut fields = FieldConstraints::default();
        if let Some(second) = self.second {
            if second > 59 {
                return Err(PulseError::SecondOutOfRange(second));
            }
            fields.seconds = second..=second;
        }
        if let Some(minute) = self.minute {
            if minute > 59 {
                return Err(PulseError::MinuteOutOfRange(minute));
            }
            fields.minutes = minute..=minute;
        }
        if let Some(hour) = self.hour {
            if hour > 23 {
                return Err(PulseError::HourOutOfRange(hour));
            }
            fields.hours = hour..=hour;
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(PulseError::DayOfMonthOutOfRange(day));
            }
            fields.days_of_month = day..=day;
        }
        if let Some(month) = self.month {
            let number = month.number_from_month();
            fields.months = number..=number;
        }
        if let (Some(day), Some(month)) = (self.day_of_month, self.month) {
            if day > longest_length_of(month) {
                return Err(PulseError::UnsatisfiableDayOfMonth { day, month });
            }
        }
        Ok(fields)
    }
}

/// The longest a month ever gets, so day 29 in February stays satisfiable
/// through leap years while day 30 does not.
fn longest_length_of(month: Month) -> u32 {
    match month {
        Month::February => 29,
        Month::April | Month::June | Month::September | Month::November => 30,
        _ => 31,
    }
}
