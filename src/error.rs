//! Error types for reset tracking
//!
//! Every variant is local and user-correctable. None of them leave the
//! stores in a partially written state: validation always runs before
//! any mutation.

use thiserror::Error;

/// Errors returned by the tracker's public operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResetError {
    /// Category is not part of the configured set.
    #[error("Invalid ammo '{input}'. Use: {valid}")]
    InvalidCategory {
        /// The raw category string as supplied
        input: String,
        /// Comma-separated list of accepted codes
        valid: String,
    },

    /// Minute-of-hour outside `0..=59`.
    #[error("Invalid minutes '{0}'. Use 00-59.")]
    InvalidMinutes(i64),

    /// Time-of-day string that is not `HH:MM`.
    #[error("Invalid time '{0}'. Use HH:MM.")]
    InvalidTimeFormat(String),

    /// Anchor lies in the future or more than 80 minutes in the past.
    #[error("This reset time is too old. Provide one from the last 80 minutes.")]
    StaleOrFutureAnchor,

    /// The view path was used again before the cooldown elapsed.
    #[error("Please wait {}m {}s before viewing resets again.", .remaining_secs / 60, .remaining_secs % 60)]
    RateLimited {
        /// Whole seconds left on the cooldown
        remaining_secs: i64,
    },

    /// Records exist but every one of them has expired.
    #[error("No active resets right now.")]
    NoActiveRecords,

    /// Nothing has ever been recorded for this view.
    #[error("No resets have been recorded yet.")]
    NoRecordsAtAll,
}

impl ResetError {
    /// Whether this is one of the two empty-result conditions.
    ///
    /// Front ends usually render both the same way.
    #[must_use]
    pub const fn is_empty_result(&self) -> bool {
        matches!(self, Self::NoActiveRecords | Self::NoRecordsAtAll)
    }
}
