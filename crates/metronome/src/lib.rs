//! Recurring-task scheduling primitives.
//!
//! metronome answers three questions for periodic work: *when* the task
//! should next run (a fixed interval, a calendar period, or a wall-clock
//! schedule such as "every day at 12:30"), *how* to suspend until that
//! moment without trusting a single long sleep, and *what happens* when a
//! run is still going as the next firing arrives.
//!
//! # Pulses and beats
//!
//! A [`Pulse`] is a lazy sequence of [`Beat`]s, one per scheduled firing.
//! Build one with [`interval_pulse`] (fixed physical duration),
//! [`period_pulse`] (calendar period in a timezone, DST- and
//! month-length-aware) or [`schedule_pulse`] (wall-clock field constraints
//! from a [`Schedule`]). Bound it with [`Pulse::take`] or
//! [`Pulse::take_while`], then consume it with [`Pulse::beat`] or
//! [`Pulse::beat_with`] under a [`RecurringJobMode`].
//!
//! # Drift correction
//!
//! All waiting goes through [`delay_until`], which sleeps in steps of at
//! most one minute and re-reads the [`Clock`] between steps. A host suspend
//! or clock adjustment is noticed within a minute; each beat records both
//! its scheduled and its actual instant, so drift is observable per firing
//! via [`Beat::drift`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use metronome::{interval_pulse, RecurringJobMode};
//!
//! #[tokio::main]
//! async fn main() -> metronome::PulseResult<()> {
//!     // Fire every minute, ten times, letting slow runs overlap.
//!     interval_pulse(Duration::from_secs(60))
//!         .take(10)?
//!         .beat_with(RecurringJobMode::Concurrent, |beat| async move {
//!             println!("due {} fired {}", beat.scheduled, beat.occurred);
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! The clock is a capability: every constructor has a `_with` variant taking
//! any [`Clock`], and the [`testing`] module ships deterministic clocks for
//! exact timing assertions under tokio's paused runtime.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Core scheduling
// -----------------------------------------------------------------
mod calendar;
pub mod clock;
pub mod delay;
pub mod error;
pub mod mode;
pub mod period;
pub mod pulse;
pub mod schedule;

// Testing utilities
// ---------------------------------------------------------------
pub mod testing;

// Re-export the primary surface for convenience
// ------------------------
pub use clock::{Clock, SystemClock};
pub use delay::{delay_for, delay_until, delay_until_local, delay_until_next};
pub use error::{PulseError, PulseResult};
pub use mode::RecurringJobMode;
pub use period::CalendarPeriod;
pub use pulse::{
    interval_pulse, interval_pulse_with, period_pulse, period_pulse_with, schedule_pulse,
    schedule_pulse_with, Beat, Pulse,
};
pub use schedule::Schedule;
