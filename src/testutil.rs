//! Shared test utilities
//!
//! Common helpers used across test modules. Only compiled in test builds.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::tracker::category::{Category, CategorySet};
use crate::tracker::clock::ManualClock;
use crate::tracker::config::TrackerConfig;
use crate::tracker::service::ResetTracker;
use crate::tracker::store::UserRef;

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp.
#[must_use]
pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A user whose label is derived from the id.
#[must_use]
pub fn user(id: &str) -> UserRef {
    UserRef::new(id, format!("user-{id}"))
}

/// A category from the default set.
#[must_use]
pub fn category(code: &str) -> Category {
    CategorySet::default().parse(code).unwrap()
}

/// A tracker on a manual clock, with default categories and cooldown.
pub struct TestTracker {
    /// The tracker under test
    pub tracker: ResetTracker,
    /// The clock it reads
    pub clock: Arc<ManualClock>,
}

impl TestTracker {
    /// Start the clock at `start`, mirroring from `source_scope` if given.
    #[must_use]
    pub fn new(start: &str, source_scope: Option<&str>) -> Self {
        let mut config = TrackerConfig::default();
        config.tracker.source_scope = source_scope.unwrap_or_default().to_string();
        let clock = Arc::new(ManualClock::new(at(start)));
        let tracker = ResetTracker::with_clock(&config, clock.clone());
        Self { tracker, clock }
    }
}
