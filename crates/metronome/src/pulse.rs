//! Pulse generation and beat execution
//!
//! A [`Pulse`] is a lazy, possibly infinite sequence of [`Beat`]s. Nothing
//! happens at construction: the clock is first read when [`Pulse::next_beat`]
//! is polled, and each beat is produced by suspending (drift-corrected, see
//! [`crate::delay`]) until its scheduled instant. Dropping the pulse, or a
//! future consuming it, tears everything down; there is no background task.
//!
//! Three cadences are available through the constructors:
//! [`interval_pulse`] (fixed physical duration), [`period_pulse`] (calendar
//! period in a timezone) and [`schedule_pulse`] (wall-clock field
//! constraints). [`Pulse::take`] and [`Pulse::take_while`] bound a sequence;
//! [`Pulse::beat`] and [`Pulse::beat_with`] consume it, running an action
//! under a [`RecurringJobMode`].

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tokio::task::{JoinError, JoinSet};
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, trace};

use crate::calendar::{next_match, FieldConstraints};
use crate::clock::{Clock, SystemClock};
use crate::delay::delay_until;
use crate::error::{PulseError, PulseResult};
use crate::mode::RecurringJobMode;
use crate::period::{resolve_local, CalendarPeriod};
use crate::schedule::Schedule;

/// One firing of a pulse.
///
/// `scheduled` is the instant the beat was due; `occurred` is the clock
/// reading once the delay resolved. The two differ by whatever drift the
/// delay absorbed, plus scheduling latency.
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use metronome::Beat;
///
/// let scheduled = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().expect("valid instant");
/// let beat = Beat { scheduled, occurred: scheduled + TimeDelta::seconds(2) };
/// assert_eq!(beat.drift(), TimeDelta::seconds(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beat {
    /// The instant this beat was due.
    pub scheduled: DateTime<Utc>,
    /// The clock reading immediately after the delay resolved.
    pub occurred: DateTime<Utc>,
}

impl Beat {
    /// How far behind (or, for a clock stepped backward, ahead of) schedule
    /// this beat fired.
    #[must_use]
    pub fn drift(&self) -> TimeDelta {
        self.occurred - self.scheduled
    }
}

/// The firing pattern and its progress. `next`/`previous` hold the committed
/// reference for the upcoming beat; `None` means the first beat, whose
/// reference is derived from the clock when polled.
#[derive(Debug)]
enum Cadence {
    Interval { every: TimeDelta, next: Option<DateTime<Utc>> },
    Period { period: CalendarPeriod, timezone: Tz, next: Option<DateTime<Utc>> },
    Calendar { fields: FieldConstraints, timezone: Tz, previous: Option<NaiveDateTime> },
}

/// A lazy sequence of [`Beat`]s on a fixed cadence.
///
/// Generic over the [`Clock`] so tests can drive it with fakes; the plain
/// constructors use [`SystemClock`].
pub struct Pulse<C: Clock = SystemClock> {
    clock: C,
    cadence: Cadence,
    remaining: Option<u32>,
    guard: Option<Box<dyn FnMut(&Beat) -> bool + Send>>,
    halted: bool,
}

impl<C: Clock + std::fmt::Debug> std::fmt::Debug for Pulse<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pulse")
            .field("clock", &self.clock)
            .field("cadence", &self.cadence)
            .field("remaining", &self.remaining)
            .field("guarded", &self.guard.is_some())
            .field("halted", &self.halted)
            .finish()
    }
}

/// A pulse firing every `every` of physical time on the system clock.
#[must_use]
pub fn interval_pulse(every: Duration) -> Pulse {
    interval_pulse_with(SystemClock, every)
}

/// A pulse firing every `every` of physical time on the given clock.
///
/// The first beat is scheduled one interval after the first poll; each later
/// beat is scheduled exactly one interval after the previous one, so the
/// scheduled instants form an arithmetic progression regardless of drift. A
/// zero interval fires back to back.
#[must_use]
pub fn interval_pulse_with<C: Clock>(clock: C, every: Duration) -> Pulse<C> {
    let every = TimeDelta::from_std(every).unwrap_or(TimeDelta::MAX);
    Pulse::with_cadence(clock, Cadence::Interval { every, next: None })
}

/// A pulse firing every calendar `period` in `timezone` on the system clock.
#[must_use]
pub fn period_pulse(period: CalendarPeriod, timezone: Tz) -> Pulse {
    period_pulse_with(SystemClock, period, timezone)
}

/// A pulse firing every calendar `period` in `timezone` on the given clock.
///
/// The first beat is scheduled one period after the first poll; each later
/// beat advances the previous scheduled instant by the period through
/// calendar arithmetic ([`CalendarPeriod::add_to`]), so monthly pulses track
/// month lengths and daily pulses track DST.
#[must_use]
pub fn period_pulse_with<C: Clock>(clock: C, period: CalendarPeriod, timezone: Tz) -> Pulse<C> {
    Pulse::with_cadence(clock, Cadence::Period { period, timezone, next: None })
}

/// A pulse firing on a wall-clock [`Schedule`], on the system clock.
///
/// # Errors
///
/// Returns a configuration error when the schedule holds out-of-domain
/// values or an unsatisfiable day/month pair.
pub fn schedule_pulse(schedule: Schedule) -> PulseResult<Pulse> {
    schedule_pulse_with(SystemClock, schedule)
}

/// A pulse firing on a wall-clock [`Schedule`], on the given clock.
///
/// Each beat's wall time is the next field match strictly after the previous
/// beat's wall time (for the first beat, after the current wall time),
/// resolved to an instant in the schedule's timezone.
///
/// # Errors
///
/// Returns a configuration error when the schedule holds out-of-domain
/// values or an unsatisfiable day/month pair.
pub fn schedule_pulse_with<C: Clock>(clock: C, schedule: Schedule) -> PulseResult<Pulse<C>> {
    let fields = schedule.field_constraints()?;
    let timezone = schedule.timezone();
    Ok(Pulse::with_cadence(clock, Cadence::Calendar { fields, timezone, previous: None }))
}

impl<C: Clock> Pulse<C> {
    fn with_cadence(clock: C, cadence: Cadence) -> Self {
        Self { clock, cadence, remaining: None, guard: None, halted: false }
    }

    /// Produces the next beat, suspending until its scheduled instant.
    ///
    /// Returns `None` once the pulse is exhausted (bound reached or a
    /// predicate declined a beat); an exhausted pulse never reads the clock
    /// again. Dropping the returned future mid-delay leaves the pulse ready
    /// to re-poll for the same beat.
    pub async fn next_beat(&mut self) -> Option<Beat> {
        if self.halted || self.remaining == Some(0) {
            return None;
        }
        let beat = self.generate().await;
        if let Some(guard) = &mut self.guard {
            if !guard(&beat) {
                self.halted = true;
                trace!(scheduled = %beat.scheduled, "pulse halted by predicate");
                return None;
            }
        }
        if let Some(remaining) = &mut self.remaining {
            *remaining -= 1;
        }
        debug!(
            scheduled = %beat.scheduled,
            occurred = %beat.occurred,
            drift_ms = beat.drift().num_milliseconds(),
            "beat emitted"
        );
        Some(beat)
    }

    /// Computes the next target, waits for it, then commits the advanced
    /// reference. The commit happens after the delay so a future dropped
    /// mid-delay has not moved the cadence.
    async fn generate(&mut self) -> Beat {
        let clock = &self.clock;
        let target = match &self.cadence {
            Cadence::Interval { every, next } => {
                next.unwrap_or_else(|| saturating_add(clock.now(), *every))
            }
            Cadence::Period { period, timezone, next } => {
                next.unwrap_or_else(|| period.add_to(clock.now(), *timezone))
            }
            Cadence::Calendar { fields, timezone, previous } => {
                let reference = previous
                    .unwrap_or_else(|| clock.now().with_timezone(timezone).naive_local());
                resolve_local(next_match(reference, fields), *timezone)
            }
        };
        delay_until(clock, target).await;
        let occurred = clock.now();
        match &mut self.cadence {
            Cadence::Interval { every, next } => *next = Some(saturating_add(target, *every)),
            Cadence::Period { period, timezone, next } => {
                *next = Some(period.add_to(target, *timezone));
            }
            Cadence::Calendar { timezone, previous, .. } => {
                // The actual local of the resolved instant, so wall times
                // swallowed by a DST gap are not used as references.
                *previous = Some(target.with_timezone(timezone).naive_local());
            }
        }
        Beat { scheduled: target, occurred }
    }

    /// Bounds the pulse to its first `count` beats.
    ///
    /// Applied repeatedly, the smallest bound wins. Once the bound is
    /// reached, [`next_beat`](Self::next_beat) returns `None` without
    /// touching the clock.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::ZeroTakeCount`] for `count == 0`.
    pub fn take(mut self, count: u32) -> PulseResult<Self> {
        if count == 0 {
            return Err(PulseError::ZeroTakeCount);
        }
        self.remaining = Some(self.remaining.map_or(count, |existing| existing.min(count)));
        Ok(self)
    }

    /// Truncates the pulse at (and excluding) the first beat for which
    /// `predicate` returns false.
    ///
    /// The declined beat still occurred in time (its delay ran); it is just
    /// not emitted. Applied repeatedly, all predicates must hold.
    #[must_use]
    pub fn take_while<F>(mut self, mut predicate: F) -> Self
    where
        F: FnMut(&Beat) -> bool + Send + 'static,
    {
        self.guard = Some(match self.guard.take() {
            None => Box::new(predicate),
            Some(mut existing) => Box::new(move |beat: &Beat| existing(beat) && predicate(beat)),
        });
        self
    }

    /// Consumes the pulse under the default mode
    /// ([`RecurringJobMode::CancellingSequential`]), running `action` for
    /// each beat. Suspends until the pulse is exhausted.
    pub async fn beat<F, Fut>(self, action: F)
    where
        F: FnMut(Beat) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.beat_with(RecurringJobMode::default(), action).await;
    }

    /// Consumes the pulse, running `action` for each beat under `mode`.
    ///
    /// Returns once the pulse is exhausted and, for the spawning modes, all
    /// invocations have either completed (`Concurrent`, and the final
    /// `CancellingSequential` invocation) or been cancelled. Dropping the
    /// returned future cancels the in-progress delay and aborts any launched
    /// invocations.
    ///
    /// # Panics
    ///
    /// A panic from an invocation is resumed on this future: when its
    /// completion is observed (`Concurrent`), when the invocation is
    /// superseded or finally awaited (`CancellingSequential`), or inline
    /// (`DelayBetweenSequential`). Remaining launched invocations are
    /// aborted by the unwind.
    pub async fn beat_with<F, Fut>(mut self, mode: RecurringJobMode, mut action: F)
    where
        F: FnMut(Beat) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match mode {
            RecurringJobMode::CancellingSequential => {
                let mut active: Option<AbortOnDropHandle<()>> = None;
                while let Some(beat) = self.next_beat().await {
                    if let Some(previous) = active.take() {
                        if !previous.is_finished() {
                            debug!(scheduled = %beat.scheduled, "cancelling superseded invocation");
                        }
                        previous.abort();
                        propagate_panic(previous.await);
                    }
                    active = Some(AbortOnDropHandle::new(tokio::spawn(action(beat))));
                }
                if let Some(last) = active {
                    propagate_panic(last.await);
                }
            }
            RecurringJobMode::Concurrent => {
                let mut invocations = JoinSet::new();
                // Completed invocations are reaped between beats, so an
                // unbounded pulse never accumulates finished tasks and a
                // panicked invocation fails the executor when observed.
                loop {
                    tokio::select! {
                        beat = self.next_beat() => match beat {
                            Some(beat) => {
                                debug!(scheduled = %beat.scheduled, "launching concurrent invocation");
                                invocations.spawn(action(beat));
                            }
                            None => break,
                        },
                        Some(result) = invocations.join_next(), if !invocations.is_empty() => {
                            propagate_panic(result);
                        }
                    }
                }
                while let Some(result) = invocations.join_next().await {
                    propagate_panic(result);
                }
            }
            RecurringJobMode::DelayBetweenSequential => {
                while let Some(beat) = self.next_beat().await {
                    action(beat).await;
                }
            }
        }
    }
}

fn saturating_add(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Resurfaces a panic from a spawned invocation on the consumer; cancelled
/// invocations are expected and ignored.
fn propagate_panic(result: Result<(), JoinError>) {
    if let Err(error) = result {
        if let Ok(reason) = error.try_into_panic() {
            std::panic::resume_unwind(reason);
        }
    }
}
