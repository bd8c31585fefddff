//! Reset tracking
//!
//! This module holds the cycle engine, the scope store, the view rate
//! limiter and the service that guards them behind one lock.

pub mod category;
pub mod clock;
pub mod config;
pub mod engine;
pub mod limiter;
pub mod service;
pub mod store;
