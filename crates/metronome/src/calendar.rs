//! Calendar field matching
//!
//! Computes the next wall-clock time whose second, minute, hour, day-of-month
//! and month all fall inside per-field inclusive ranges. Resolution settles
//! month, then day, then hour, minute and second; carries propagate from the
//! finest unit upward, so the most significant unit settles last.
//!
//! Everything here is pure arithmetic over naive local date-times. Timezone
//! resolution happens in [`crate::period`] once a local target is known.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Upper bound on month steps while searching for a month long enough to hold
/// the day range minimum. Satisfiability is validated at configuration time;
/// the slowest surviving case (February 29th) recurs within eight years.
const MAX_MONTH_ADVANCES: u32 = 120;

/// Validated inclusive ranges for each calendar field.
///
/// Constructed through [`Schedule`](crate::Schedule), which rejects
/// out-of-domain bounds and day/month combinations no real date satisfies
/// before any matching runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldConstraints {
    pub(crate) seconds: RangeInclusive<u32>,
    pub(crate) minutes: RangeInclusive<u32>,
    pub(crate) hours: RangeInclusive<u32>,
    pub(crate) days_of_month: RangeInclusive<u32>,
    pub(crate) months: RangeInclusive<u32>,
}

impl Default for FieldConstraints {
    /// Full natural domains, matching every whole second.
    fn default() -> Self {
        Self { seconds: 0..=59, minutes: 0..=59, hours: 0..=23, days_of_month: 1..=31, months: 1..=12 }
    }
}

impl FieldConstraints {
    /// True when `t` sits on a permitted whole second.
    fn matches(&self, t: &RawDateTime) -> bool {
        t.nanos == 0
            && self.seconds.contains(&t.second)
            && self.minutes.contains(&t.minute)
            && self.hours.contains(&t.hour)
            && self.days_of_month.contains(&t.day)
            && self.months.contains(&t.month)
    }
}

/// Field-level view of a date-time, cheap to copy while carries resolve.
/// Intermediate values may briefly hold fields a caller is about to
/// overwrite, but day/month always name a real date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawDateTime {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanos: u32,
}

impl From<NaiveDateTime> for RawDateTime {
    fn from(value: NaiveDateTime) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
            nanos: value.nanosecond(),
        }
    }
}

impl RawDateTime {
    fn into_naive(self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_nano_opt(self.hour, self.minute, self.second, self.nanos))
            .unwrap_or_else(|| unreachable!("carry resolution produced an invalid date-time: {self:?}"))
    }
}

/// Returns the earliest date-time strictly after `current` whose fields all
/// sit inside `fields`, landing on a whole second.
///
/// A `current` value already on a permitted whole second advances by at least
/// one second rather than matching itself.
pub(crate) fn next_match(current: NaiveDateTime, fields: &FieldConstraints) -> NaiveDateTime {
    let mut raw = RawDateTime::from(current);
    if fields.matches(&raw) {
        // A non-zero fraction makes the second stage step past the current
        // second, forcing a strict advance.
        raw.nanos = 1;
    }
    let step = resolve_month(raw, fields, false);
    let step = resolve_day(step, fields, false);
    let step = resolve_hour(step, fields, false);
    let step = resolve_minute(step, fields, false);
    let step = resolve_second(step, fields);
    step.into_naive()
}

/// Settles the month field. `carry` advances one month first, rolling the
/// year at December. Carrying callers must pass `day` already reset to 1 so
/// every intermediate value stays a real date.
fn resolve_month(t: RawDateTime, fields: &FieldConstraints, carry: bool) -> RawDateTime {
    let range = &fields.months;
    let (t, candidate) = if carry {
        if t.month == 12 {
            (RawDateTime { year: t.year + 1, ..t }, 1)
        } else {
            (t, t.month + 1)
        }
    } else {
        (t, t.month)
    };
    if range.contains(&candidate) {
        RawDateTime { month: candidate, ..t }
    } else if candidate < *range.start() {
        RawDateTime { month: *range.start(), day: 1, hour: 0, minute: 0, second: 0, nanos: 0, ..t }
    } else {
        RawDateTime {
            year: t.year + 1,
            month: *range.start(),
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            nanos: 0,
            ..t
        }
    }
}

/// Settles the day-of-month field against real month lengths. When no
/// permitted day exists in the current month, the search rolls month by month
/// until the day range minimum fits.
fn resolve_day(t: RawDateTime, fields: &FieldConstraints, carry: bool) -> RawDateTime {
    let range = &fields.days_of_month;
    let candidate = if carry { t.day + 1 } else { t.day };
    if candidate > days_in_month(t.year, t.month) {
        return advance_day_into_next_month(t, fields);
    }
    if range.contains(&candidate) {
        RawDateTime { day: candidate, ..t }
    } else if candidate < *range.start() {
        if *range.start() <= days_in_month(t.year, t.month) {
            RawDateTime { day: *range.start(), hour: 0, minute: 0, second: 0, nanos: 0, ..t }
        } else {
            advance_day_into_next_month(t, fields)
        }
    } else {
        advance_day_into_next_month(t, fields)
    }
}

/// Moves to the first permitted month long enough to hold the day range
/// minimum, landing on that day at midnight.
fn advance_day_into_next_month(t: RawDateTime, fields: &FieldConstraints) -> RawDateTime {
    let first_day = *fields.days_of_month.start();
    let reset = RawDateTime { day: 1, hour: 0, minute: 0, second: 0, nanos: 0, ..t };
    let mut stepped = resolve_month(reset, fields, true);
    for _ in 0..MAX_MONTH_ADVANCES {
        if first_day <= days_in_month(stepped.year, stepped.month) {
            return RawDateTime { day: first_day, ..stepped };
        }
        stepped = resolve_month(RawDateTime { day: 1, ..stepped }, fields, true);
    }
    unreachable!("no permitted month admits day {first_day} within {MAX_MONTH_ADVANCES} steps")
}

/// Settles the hour field; overflow past the range maximum carries into the
/// day.
fn resolve_hour(t: RawDateTime, fields: &FieldConstraints, carry: bool) -> RawDateTime {
    let range = &fields.hours;
    let candidate = t.hour + u32::from(carry);
    if range.contains(&candidate) {
        RawDateTime { hour: candidate, ..t }
    } else if candidate < *range.start() {
        RawDateTime { hour: *range.start(), minute: 0, second: 0, nanos: 0, ..t }
    } else {
        let stepped = resolve_day(t, fields, true);
        RawDateTime { hour: *range.start(), minute: 0, second: 0, nanos: 0, ..stepped }
    }
}

/// Settles the minute field; overflow carries into the hour.
fn resolve_minute(t: RawDateTime, fields: &FieldConstraints, carry: bool) -> RawDateTime {
    let range = &fields.minutes;
    let candidate = t.minute + u32::from(carry);
    if range.contains(&candidate) {
        RawDateTime { minute: candidate, ..t }
    } else if candidate < *range.start() {
        RawDateTime { minute: *range.start(), second: 0, nanos: 0, ..t }
    } else {
        let stepped = resolve_hour(t, fields, true);
        RawDateTime { minute: *range.start(), second: 0, nanos: 0, ..stepped }
    }
}

/// Settles the second field; a non-zero fraction forces the next second, and
/// the result always lands on a whole second.
fn resolve_second(t: RawDateTime, fields: &FieldConstraints) -> RawDateTime {
    let range = &fields.seconds;
    let candidate = if t.nanos > 0 { t.second + 1 } else { t.second };
    let settled = if range.contains(&candidate) {
        RawDateTime { second: candidate, ..t }
    } else if candidate < *range.start() {
        RawDateTime { second: *range.start(), ..t }
    } else {
        let stepped = resolve_minute(t, fields, true);
        RawDateTime { second: *range.start(), ..stepped }
    };
    RawDateTime { nanos: 0, ..settled }
}

/// Number of days in a month, leap-aware.
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month {month} outside 1..=12"),
    }
}

/// Gregorian leap-year rule.
fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
