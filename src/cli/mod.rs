//! Console front end
//!
//! Structured command parsing and plain-text rendering for the interactive
//! console. The tracker itself never depends on this module.

pub mod command;
pub mod display;

pub use command::{dispatch, Command, CommandLine, Reply, Session};
pub use display::ConsoleDisplay;
