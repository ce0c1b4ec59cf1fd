//! Test clocks
//!
//! Deterministic [`Clock`] implementations for exercising time-dependent
//! code: [`MockClock`] is advanced by hand, [`VirtualClock`] follows tokio's
//! (possibly paused) timer from a fixed epoch, and [`ScriptedClock`] replays
//! an exact sequence of readings so a test can count clock accesses.
//!
//! ```
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use metronome::clock::Clock;
//! use metronome::testing::MockClock;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid instant");
//! let clock = MockClock::new(start);
//! clock.advance(TimeDelta::minutes(5));
//! assert_eq!(clock.now(), start + TimeDelta::minutes(5));
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::Clock;

/// A clock frozen at a configurable instant.
///
/// Time moves only through [`advance`](Self::advance) and
/// [`set`](Self::set), which makes it the right fake for code that must not
/// observe time passing on its own.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    /// A clock reading `start` until told otherwise.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    /// Moves the clock forward (or, with a negative delta, backward).
    pub fn advance(&self, delta: TimeDelta) {
        // Test utility: panic on poisoned mutex to fail tests early.
        let mut now = self.now.lock().expect("mutex poisoned");
        *now += delta;
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        // Test utility: panic on poisoned mutex to fail tests early.
        *self.now.lock().expect("mutex poisoned") = instant;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        // Test utility: panic on poisoned mutex to fail tests early.
        *self.now.lock().expect("mutex poisoned")
    }
}

/// A clock that maps tokio's timer onto calendar time from a fixed epoch.
///
/// Under a `start_paused = true` runtime the timer only moves when sleeps
/// resolve, so readings are exact and tests can assert precise instants.
#[derive(Debug, Clone, Copy)]
pub struct VirtualClock {
    epoch: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl VirtualClock {
    /// Anchors `epoch` to the current tokio instant; must run inside a
    /// runtime.
    #[must_use]
    pub fn start_at(epoch: DateTime<Utc>) -> Self {
        Self { epoch, origin: tokio::time::Instant::now() }
    }

    /// The instant this clock read at its creation.
    #[must_use]
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        self.epoch + TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::MAX)
    }
}

/// A clock that replays a fixed sequence of readings.
///
/// Every `now()` consumes one reading, so a test scripting `n` values
/// asserts that exactly `n` clock accesses happen; running past the script
/// panics the test.
#[derive(Debug)]
pub struct ScriptedClock {
    script: Mutex<VecDeque<DateTime<Utc>>>,
}

impl ScriptedClock {
    /// A clock that returns `readings` in order.
    #[must_use]
    pub fn new<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        Self { script: Mutex::new(readings.into_iter().collect()) }
    }

    /// Readings not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        // Test utility: panic on poisoned mutex to fail tests early.
        self.script.lock().expect("mutex poisoned").len()
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        // Test utility: panic on poisoned mutex to fail tests early.
        self.script
            .lock()
            .expect("mutex poisoned")
            .pop_front()
            .expect("clock script exhausted; script one reading per expected access")
    }
}
