//! Test clocks — deterministic `Clock` implementations for tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use democopilot_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that only moves when a test advances it. Clones share the same
/// time, so a test can keep one handle while the engine holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock starting at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Creates a clock starting at 2026-01-15 10:00:00 UTC.
    ///
    /// # Panics
    ///
    /// Never in practice; the literal date is valid.
    #[must_use]
    pub fn at_default_start() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    /// Moves the clock forward by `seconds`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn advance_secs(&self, seconds: i64) {
        *self.now.lock().unwrap() += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A clock that follows tokio's time source.
///
/// Under a paused test runtime, session time advances exactly as far as
/// tokio's virtual clock does, so pause accounting can be checked against
/// `tokio::time::sleep` in the same test.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    /// Starts at 2026-01-15 10:00:00 UTC at the current tokio instant.
    ///
    /// # Panics
    ///
    /// Never in practice; the literal date is valid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            started: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        self.origin + TimeDelta::from_std(self.started.elapsed()).unwrap_or(TimeDelta::zero())
    }
}
