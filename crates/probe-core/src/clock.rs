//! Clock abstraction.
//!
//! The engine reads wall time through [`Clock`] to stamp history items and to
//! account for the cost of creation calls within a round.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock with a fixed time.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    now: DateTime<Utc>,
}

impl MockClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Mock clock that moves forward by a fixed step on every read.
#[derive(Debug)]
pub struct AdvancingClock {
    now: Mutex<DateTime<Utc>>,
    step: TimeDelta,
}

impl AdvancingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            now: Mutex::new(start),
            step: TimeDelta::from_std(step).unwrap_or(TimeDelta::zero()),
        }
    }
}

impl Clock for AdvancingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *now;
        *now = current + self.step;
        current
    }
}

/// Non-negative wall time between two readings.
pub fn elapsed_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or_default()
}
