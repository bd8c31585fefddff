//! Wall-clock source
//!
//! All times are naive process-local wall clock. The clock is injected so
//! tests can pin and advance "now" deterministically.

use std::sync::{Mutex, PoisonError};

use chrono::{Duration, Local, NaiveDateTime};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local time without timezone.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the process-local system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create a clock pinned at `start`.
    #[must_use]
    pub const fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    /// Move forward (or backward, for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
