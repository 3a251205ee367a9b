//! Clock abstraction for determinism.

use chrono::{DateTime, TimeDelta, Utc};

/// Abstraction over wall-clock time so session accounting can be tested
/// deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Time elapsed since `earlier`, clamped at zero if the clock moved
    /// backwards.
    fn since(&self, earlier: DateTime<Utc>) -> TimeDelta {
        (self.now() - earlier).max(TimeDelta::zero())
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
