//! Drift-corrected suspension
//!
//! A plain `sleep(target - now)` trusts the timer for the whole span: if the
//! host suspends, or the clock is adjusted, the wake-up lands in the wrong
//! place and nothing notices. [`delay_until`] instead sleeps in bounded steps
//! and re-reads the [`Clock`] between them, so any divergence between timer
//! and clock is picked up within a minute.
//!
//! The wall-clock variants derive a UTC target through local-time arithmetic
//! (DST-aware, per the policy in [`crate::period`]) and then defer to
//! [`delay_until`].

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::period::{resolve_local, CalendarPeriod};

/// Longest single sleep between clock re-reads.
const DRIFT_CHECK_SECONDS: i64 = 60;

/// Suspends until `clock` reports an instant at or past `target`.
///
/// Returns immediately when the target is already in the past. Each
/// iteration sleeps the smaller of the remaining span and one minute, then
/// re-reads the clock, so a clock jumping ahead resolves the delay within a
/// minute and a clock falling behind extends it.
///
/// Cancelling the returned future cancels the in-progress sleep; no state
/// outlives it.
pub async fn delay_until<C: Clock>(clock: &C, target: DateTime<Utc>) {
    loop {
        let now = clock.now();
        let remaining = target - now;
        if remaining <= TimeDelta::zero() {
            return;
        }
        let step = remaining.min(TimeDelta::seconds(DRIFT_CHECK_SECONDS));
        trace!(until = %target, remaining_ms = remaining.num_milliseconds(), "drift-check sleep");
        tokio::time::sleep(step.to_std().unwrap_or(std::time::Duration::ZERO)).await;
    }
}

/// Suspends until the wall clock in `timezone` reads `local`.
///
/// A skipped or repeated local time resolves per the policy in
/// [`crate::period`]; a local time already in the past returns immediately.
pub async fn delay_until_local<C: Clock>(clock: &C, local: NaiveDateTime, timezone: Tz) {
    let target = resolve_local(local, timezone);
    debug!(%local, %timezone, until = %target, "delaying until local time");
    delay_until(clock, target).await;
}

/// Suspends for one calendar period from now.
///
/// Calendar components count wall-clock units in `timezone` (a day across a
/// DST transition is 23 or 25 physical hours); time components are exact.
pub async fn delay_for<C: Clock>(clock: &C, period: CalendarPeriod, timezone: Tz) {
    let target = period.add_to(clock.now(), timezone);
    debug!(?period, %timezone, until = %target, "delaying for period");
    delay_until(clock, target).await;
}

/// Suspends until the next occurrence of `time_of_day` in `timezone`.
///
/// Today's occurrence is used only while it is still strictly in the future;
/// otherwise the delay targets tomorrow's, so back-to-back calls wait a full
/// day apart.
pub async fn delay_until_next<C: Clock>(clock: &C, time_of_day: NaiveTime, timezone: Tz) {
    let now = clock.now();
    let today = now.with_timezone(&timezone).date_naive();
    let today_at = resolve_local(today.and_time(time_of_day), timezone);
    let target = if today_at > now {
        today_at
    } else {
        let tomorrow = today
            .succ_opt()
            .unwrap_or_else(|| unreachable!("date range exhausted advancing past {today}"));
        resolve_local(tomorrow.and_time(time_of_day), timezone)
    };
    debug!(%time_of_day, %timezone, until = %target, "delaying until next occurrence");
    delay_until(clock, target).await;
}
