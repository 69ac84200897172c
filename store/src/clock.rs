//! Clock trait - abstracts time operations for testability.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Source of the current time.
///
/// Production code uses [`SystemClock`]; tests inject a [`StepClock`] so
/// timestamp ordering assertions are deterministic.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock that advances by a fixed step on every `now()` call.
///
/// Each observed timestamp is strictly later than the previous one, which
/// is what the `updated_at > created_at` properties need.
#[derive(Debug)]
pub struct StepClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl StepClock {
    /// Creates a clock starting at `start`, advancing `step` per call.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    /// Clock starting at `start` that ticks one millisecond per call.
    #[must_use]
    pub fn millis(start: DateTime<Utc>) -> Self {
        Self::new(start, Duration::milliseconds(1))
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let Ok(mut current) = self.current.lock() else {
            // A poisoned lock means a test thread panicked mid-tick;
            // fall back to the wall clock rather than propagating.
            return Utc::now();
        };
        let now = *current;
        *current += self.step;
        now
    }
}
