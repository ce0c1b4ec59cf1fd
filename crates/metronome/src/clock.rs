//! Clock abstraction over wall-clock time
//!
//! Every scheduling decision in this crate reads time through the [`Clock`]
//! trait, so production code runs against [`SystemClock`] while tests run
//! against the deterministic clocks in [`crate::testing`].
//!
//! # Examples
//!
//! ```
//! use metronome::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! assert!(clock.now() >= now);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Trait for reading the current wall-clock instant
///
/// The single operation keeps the capability minimal: anything that can
/// report "now" can drive a pulse. Implementations must be cheap to call and
/// safe to share across tasks.
pub trait Clock: Send + Sync {
    /// Get the current instant as UTC wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock implementation
///
/// Reads the host's wall clock. Use this in production code.
///
/// # Examples
///
/// ```
/// use metronome::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// println!("current time: {}", clock.now());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A shared clock reads through to the inner clock, so one instance can feed
/// several pulses.
impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        self.as_ref().now()
    }
}
