//! Per-user cooldown for the free-form view path
//!
//! Deciding and recording are separate steps: callers gate with
//! [`RateLimiter::try_acquire`], attempt the read, and only call
//! [`RateLimiter::commit`] when the read produced something to show.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

/// Default cooldown between views for one user.
pub const DEFAULT_COOLDOWN_SECS: i64 = 300;

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The user may view now
    Allowed,
    /// The user must wait
    Denied {
        /// Whole seconds left, truncated
        remaining_secs: i64,
    },
}

/// Last successful view per user id.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_use: HashMap<String, NaiveDateTime>,
}

impl RateLimiter {
    /// Create a limiter with the given cooldown.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_use: HashMap::new(),
        }
    }

    /// The configured cooldown.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Check whether `user_id` may view at `now`. Does not record anything.
    #[must_use]
    pub fn try_acquire(&self, user_id: &str, now: NaiveDateTime) -> Gate {
        let Some(last) = self.last_use.get(user_id) else {
            return Gate::Allowed;
        };

        let elapsed = now - *last;
        if elapsed >= self.cooldown {
            Gate::Allowed
        } else {
            Gate::Denied {
                remaining_secs: (self.cooldown - elapsed).num_seconds(),
            }
        }
    }

    /// Record a successful view, replacing any earlier timestamp.
    pub fn commit(&mut self, user_id: &str, now: NaiveDateTime) {
        self.last_use.insert(user_id.to_string(), now);
    }

    /// When `user_id` last viewed successfully, if ever.
    #[must_use]
    pub fn last_use(&self, user_id: &str) -> Option<NaiveDateTime> {
        self.last_use.get(user_id).copied()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}
