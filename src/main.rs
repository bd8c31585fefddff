//! Reset Tracker - shared price reset cycle tracking
//!
//! Console entry point. Reads one command per line from stdin.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use reset_tracker::cli::{dispatch, CommandLine, ConsoleDisplay, Session};
use reset_tracker::{ResetTracker, ScopeId, TrackerConfig, UserRef};

/// Shared price reset cycle tracker
///
/// Record when a category's price last reset, then ask where each
/// 80-minute cycle stands. Commands are read from stdin, one per line,
/// e.g. `reset --minutes 5 --ammo M995` or `resets`.
#[derive(Parser, Debug)]
#[command(name = "reset-tracker", version, about)]
struct Cli {
    /// Path to the resets.toml configuration file (defaults apply if missing)
    #[arg(long, default_value = "resets.toml")]
    config: PathBuf,

    /// Default scope for commands that do not pass --scope
    #[arg(long, default_value = "local")]
    scope: String,

    /// Default user for commands that do not pass --user
    #[arg(long, default_value = "console")]
    user: String,

    /// Print replies as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> Result<TrackerConfig> {
    if path.exists() {
        TrackerConfig::from_path(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        Ok(TrackerConfig::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&cli.config)?;
    let tracker = ResetTracker::new(&config);
    let source_scope = config.source_scope();
    tracing::info!(
        categories = %tracker.categories(),
        source_scope = source_scope.as_ref().map_or("-", ScopeId::as_str),
        "reset-tracker v{} ready",
        env!("CARGO_PKG_VERSION")
    );

    let session = Session {
        scope: ScopeId::new(cli.scope.as_str()),
        user: UserRef::new(cli.user.as_str(), cli.user.as_str()),
    };
    let display = ConsoleDisplay::new(cli.json);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = match CommandLine::parse_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match dispatch(&tracker, &session, &parsed) {
            Ok(Some(reply)) => display.print_reply(&reply),
            Ok(None) => break,
            Err(e) => display.print_error(&e),
        }
    }

    Ok(())
}
