//! Calendar-aware period arithmetic
//!
//! A [`CalendarPeriod`] separates calendar components (years, months, days)
//! from time components (hours down to nanoseconds). Calendar components
//! advance through local wall-clock arithmetic in a timezone, so "one day"
//! lands on the same wall time even when the day spans a DST transition; time
//! components are exact physical durations.
//!
//! This module also owns the policy for turning a naive local time back into
//! an instant: ambiguous local times (the repeated hour when clocks fall
//! back) resolve to the earlier instant, and local times inside a DST gap
//! shift forward by interpreting them with the pre-transition offset.

use chrono::{DateTime, LocalResult, Months, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// How far back to probe for a resolvable local time when a target falls
/// inside a DST gap. Real transitions top out around a day (date-line moves);
/// 48 hours plus an hour of slack covers them all.
const MAX_GAP_PROBE_MINUTES: i64 = 48 * 60 + 60;

/// A duration expressed in calendar components plus an exact time offset.
///
/// Negative components subtract. Fields combine through struct update syntax:
///
/// ```
/// use metronome::CalendarPeriod;
///
/// let every_month_and_a_half_day = CalendarPeriod {
///     months: 1,
///     hours: 36,
///     ..CalendarPeriod::ZERO
/// };
/// assert_eq!(every_month_and_a_half_day.days, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarPeriod {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl CalendarPeriod {
    /// The empty period; [`add_to`](Self::add_to) with it is the identity.
    pub const ZERO: Self =
        Self { years: 0, months: 0, days: 0, hours: 0, minutes: 0, seconds: 0, nanoseconds: 0 };

    /// A period of whole years.
    #[must_use]
    pub const fn years(years: i32) -> Self {
        Self { years, ..Self::ZERO }
    }

    /// A period of whole calendar months.
    #[must_use]
    pub const fn months(months: i32) -> Self {
        Self { months, ..Self::ZERO }
    }

    /// A period of whole calendar days.
    #[must_use]
    pub const fn days(days: i32) -> Self {
        Self { days, ..Self::ZERO }
    }

    /// A period of whole hours (exact physical duration).
    #[must_use]
    pub const fn hours(hours: i64) -> Self {
        Self { hours, ..Self::ZERO }
    }

    /// A period of whole minutes (exact physical duration).
    #[must_use]
    pub const fn minutes(minutes: i64) -> Self {
        Self { minutes, ..Self::ZERO }
    }

    /// A period of whole seconds (exact physical duration).
    #[must_use]
    pub const fn seconds(seconds: i64) -> Self {
        Self { seconds, ..Self::ZERO }
    }

    /// A period of nanoseconds (exact physical duration).
    #[must_use]
    pub const fn nanoseconds(nanoseconds: i64) -> Self {
        Self { nanoseconds, ..Self::ZERO }
    }

    /// True when every component is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
            && self.nanoseconds == 0
    }

    /// Advances `instant` by this period, doing calendar components through
    /// local wall-clock arithmetic in `timezone` and time components as an
    /// exact physical duration on the resulting instant.
    ///
    /// Month addition clamps the day of month to the target month's length,
    /// so January 31st plus one month is the last day of February. When the
    /// shifted wall time does not exist or exists twice, the gap/ambiguity
    /// policy in the module docs applies.
    ///
    /// # Panics
    ///
    /// Panics when the result falls outside the representable date-time
    /// range (roughly ±262,000 years from the common era).
    #[must_use]
    pub fn add_to(&self, instant: DateTime<Utc>, timezone: Tz) -> DateTime<Utc> {
        let total_months = i64::from(self.years) * 12 + i64::from(self.months);
        let anchored = if total_months == 0 && self.days == 0 {
            // No calendar component; skip the local round-trip so the
            // ambiguous-hour policy cannot move the anchor.
            instant
        } else {
            let local = instant.with_timezone(&timezone).naive_local();
            let shifted = shift_date(local, total_months, self.days).unwrap_or_else(|| {
                unreachable!("calendar arithmetic left the representable range: {self:?} applied to {local}")
            });
            resolve_local(shifted, timezone)
        };
        anchored + self.time_offset()
    }

    /// The physical-duration part of the period.
    fn time_offset(&self) -> TimeDelta {
        TimeDelta::hours(self.hours)
            + TimeDelta::minutes(self.minutes)
            + TimeDelta::seconds(self.seconds)
            + TimeDelta::nanoseconds(self.nanoseconds)
    }
}

/// Applies month and day offsets to a local date-time, months first with the
/// day clamped to the target month's length.
fn shift_date(local: NaiveDateTime, months: i64, days: i32) -> Option<NaiveDateTime> {
    let by_months = if months >= 0 {
        u32::try_from(months).ok().and_then(|n| local.checked_add_months(Months::new(n)))?
    } else {
        u32::try_from(months.unsigned_abs())
            .ok()
            .and_then(|n| local.checked_sub_months(Months::new(n)))?
    };
    by_months.checked_add_signed(TimeDelta::days(i64::from(days)))
}

/// Resolves a naive local time in `timezone` to a UTC instant.
///
/// Unique local times map directly. The repeated hour after clocks fall back
/// maps to the earlier of its two instants. A local time skipped by clocks
/// springing forward is interpreted with the offset in force just before the
/// transition, which shifts it forward past the gap.
pub(crate) fn resolve_local(local: NaiveDateTime, timezone: Tz) -> DateTime<Utc> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(resolved) => resolved.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => resolve_gap(local, timezone),
    }
}

/// Probes backward for the offset in force before the transition that
/// swallowed `local`, then applies it.
fn resolve_gap(local: NaiveDateTime, timezone: Tz) -> DateTime<Utc> {
    for minutes in 1..=MAX_GAP_PROBE_MINUTES {
        let probe = local - TimeDelta::minutes(minutes);
        let offset = match timezone.offset_from_local_datetime(&probe) {
            LocalResult::Single(offset) => offset,
            LocalResult::Ambiguous(earlier, _) => earlier,
            LocalResult::None => continue,
        };
        let utc_naive = local - TimeDelta::seconds(i64::from(offset.fix().local_minus_utc()));
        return Utc.from_utc_datetime(&utc_naive);
    }
    unreachable!("no resolvable local time within {MAX_GAP_PROBE_MINUTES} minutes before {local} in {timezone}")
}

#[cfg(test)]
mod tests {
    //! Unit tests for period arithmetic and local-time resolution.
    use chrono::NaiveDate;
    use chrono_tz::America::New_York;
    use chrono_tz::UTC;

    use super::*;

    fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .expect("valid test instant")
    }

    fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid test date")
    }

    /// Validates `CalendarPeriod` component constructors.
    ///
    /// Assertions:
    /// - Confirms each constructor sets exactly one field.
    /// - Confirms the zero period reports itself as zero.
    #[test]
    fn test_component_constructors_set_single_fields() {
        assert_eq!(CalendarPeriod::years(2), CalendarPeriod { years: 2, ..CalendarPeriod::ZERO });
        assert_eq!(CalendarPeriod::months(3), CalendarPeriod { months: 3, ..CalendarPeriod::ZERO });
        assert_eq!(CalendarPeriod::days(10), CalendarPeriod { days: 10, ..CalendarPeriod::ZERO });
        assert_eq!(CalendarPeriod::hours(5), CalendarPeriod { hours: 5, ..CalendarPeriod::ZERO });
        assert_eq!(
            CalendarPeriod::minutes(30),
            CalendarPeriod { minutes: 30, ..CalendarPeriod::ZERO }
        );
        assert_eq!(
            CalendarPeriod::seconds(45),
            CalendarPeriod { seconds: 45, ..CalendarPeriod::ZERO }
        );
        assert_eq!(
            CalendarPeriod::nanoseconds(500),
            CalendarPeriod { nanoseconds: 500, ..CalendarPeriod::ZERO }
        );
        assert!(CalendarPeriod::ZERO.is_zero());
        assert!(!CalendarPeriod::days(1).is_zero());
        assert_eq!(CalendarPeriod::default(), CalendarPeriod::ZERO);
    }

    /// Validates `CalendarPeriod::add_to` identity for the zero period.
    ///
    /// Assertions:
    /// - Confirms the zero period returns the input instant unchanged.
    #[test]
    fn test_zero_period_is_identity() {
        let instant = utc(2024, 6, 15, 12, 0, 0);

        assert_eq!(CalendarPeriod::ZERO.add_to(instant, New_York), instant);
    }

    /// Validates `CalendarPeriod::add_to` day clamping for month addition.
    ///
    /// Assertions:
    /// - Confirms January 31st plus one month is February 28th off leap years.
    /// - Confirms January 31st plus one month is February 29th in leap years.
    #[test]
    fn test_month_addition_clamps_day_to_month_length() {
        let period = CalendarPeriod::months(1);

        assert_eq!(period.add_to(utc(2023, 1, 31, 12, 0, 0), UTC), utc(2023, 2, 28, 12, 0, 0));
        assert_eq!(period.add_to(utc(2024, 1, 31, 12, 0, 0), UTC), utc(2024, 2, 29, 12, 0, 0));
    }

    /// Validates `CalendarPeriod::add_to` component ordering.
    ///
    /// Assertions:
    /// - Confirms months apply before days, so the clamp happens first.
    #[test]
    fn test_months_apply_before_days() {
        let period = CalendarPeriod { months: 1, days: 1, ..CalendarPeriod::ZERO };

        assert_eq!(period.add_to(utc(2023, 1, 31, 12, 0, 0), UTC), utc(2023, 3, 1, 12, 0, 0));
    }

    /// Validates `CalendarPeriod::add_to` with negative months.
    ///
    /// Assertions:
    /// - Confirms subtraction clamps into a shorter month.
    #[test]
    fn test_negative_months_subtract_with_clamp() {
        let period = CalendarPeriod::months(-1);

        assert_eq!(period.add_to(utc(2024, 3, 31, 12, 0, 0), UTC), utc(2024, 2, 29, 12, 0, 0));
    }

    /// Validates `CalendarPeriod::add_to` calendar-day semantics across a DST
    /// transition.
    ///
    /// Assertions:
    /// - Confirms one calendar day keeps the local wall time.
    /// - Confirms the physical gap is 23 hours across spring forward.
    #[test]
    fn test_calendar_day_across_spring_forward_keeps_wall_time() {
        let start = utc(2024, 3, 9, 13, 0, 0);

        let next = CalendarPeriod::days(1).add_to(start, New_York);

        assert_eq!(next, utc(2024, 3, 10, 12, 0, 0));
        assert_eq!(next - start, TimeDelta::hours(23));
    }

    /// Validates `CalendarPeriod::add_to` physical-time semantics across a
    /// DST transition.
    ///
    /// Assertions:
    /// - Confirms hour components add exact physical duration even when the
    ///   local clock jumps.
    #[test]
    fn test_hour_component_is_physical_across_spring_forward() {
        let start = utc(2024, 3, 10, 5, 30, 0);

        let next = CalendarPeriod::hours(2).add_to(start, New_York);

        assert_eq!(next, utc(2024, 3, 10, 7, 30, 0));
        assert_eq!(next - start, TimeDelta::hours(2));
    }

    /// Validates `resolve_local` for a unique local time.
    ///
    /// Assertions:
    /// - Confirms the mapped instant reflects the zone offset.
    #[test]
    fn test_resolve_local_unique_time() {
        let resolved = resolve_local(local(2024, 6, 15, 9, 0), New_York);

        assert_eq!(resolved, utc(2024, 6, 15, 13, 0, 0));
    }

    /// Validates `resolve_local` inside a spring-forward gap.
    ///
    /// Assertions:
    /// - Confirms the skipped wall time shifts forward past the gap.
    #[test]
    fn test_resolve_local_gap_shifts_forward() {
        let resolved = resolve_local(local(2024, 3, 10, 2, 30), New_York);

        assert_eq!(resolved, utc(2024, 3, 10, 7, 30, 0));
    }

    /// Validates `resolve_local` for an ambiguous fall-back time.
    ///
    /// Assertions:
    /// - Confirms the repeated hour maps to its earlier instant.
    #[test]
    fn test_resolve_local_ambiguous_takes_earlier_instant() {
        let resolved = resolve_local(local(2024, 11, 3, 1, 30), New_York);

        assert_eq!(resolved, utc(2024, 11, 3, 5, 30, 0));
    }

    /// Validates `CalendarPeriod::add_to` when the shifted wall time lands in
    /// a gap.
    ///
    /// Assertions:
    /// - Confirms the result shifts forward instead of failing.
    #[test]
    fn test_add_to_landing_in_gap_shifts_forward() {
        let start = utc(2024, 3, 9, 7, 30, 0);

        let next = CalendarPeriod::days(1).add_to(start, New_York);

        assert_eq!(next, utc(2024, 3, 10, 7, 30, 0));
    }
}
