//! Reset Tracker - shared price reset cycle tracking
//!
//! Tracks recurring 80-minute reset cycles per category, reports the live
//! phase of each cycle on demand, and mirrors one designated scope's state
//! to every other scope.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod error;
pub mod tracker;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use error::ResetError;
pub use tracker::category::{Category, CategorySet};
pub use tracker::clock::{Clock, ManualClock, SystemClock};
pub use tracker::config::TrackerConfig;
pub use tracker::engine::{normalize, phase, CycleInfo, Phase, TimeInput};
pub use tracker::limiter::{Gate, RateLimiter};
pub use tracker::service::{CycleReport, ResetTracker, ScopeView, Submission};
pub use tracker::store::{ActiveReset, Provenance, ResetRecord, ScopeId, ScopeStore, UserRef};
