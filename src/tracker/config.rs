//! Tracker configuration parser
//!
//! Parses `resets.toml` into the settings the tracker needs at startup.
//! The 40/80-minute cycle shape is fixed and cannot be configured.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::tracker::category::{CategorySet, DEFAULT_CATEGORIES};
use crate::tracker::limiter::DEFAULT_COOLDOWN_SECS;
use crate::tracker::store::ScopeId;

/// Settings under the `[tracker]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Scope whose submissions mirror into the global state (empty: none)
    #[serde(default)]
    pub source_scope: String,
    /// Accepted category codes
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Cooldown between views for one user (default: 300)
    #[serde(default = "default_view_cooldown_secs")]
    pub view_cooldown_secs: i64,
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect()
}

const fn default_view_cooldown_secs() -> i64 {
    DEFAULT_COOLDOWN_SECS
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            source_scope: String::new(),
            categories: default_categories(),
            view_cooldown_secs: default_view_cooldown_secs(),
        }
    }
}

/// Top-level configuration parsed from resets.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Tracker settings
    #[serde(default)]
    pub tracker: TrackerSettings,
}

impl TrackerConfig {
    /// Parse a resets.toml file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse resets.toml content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse resets.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// The designated source scope, if one is configured
    #[must_use]
    pub fn source_scope(&self) -> Option<ScopeId> {
        let raw = self.tracker.source_scope.trim();
        (!raw.is_empty()).then(|| ScopeId::new(raw))
    }

    /// The accepted category set
    #[must_use]
    pub fn category_set(&self) -> CategorySet {
        CategorySet::new(&self.tracker.categories)
    }

    /// Cooldown for the view path
    #[must_use]
    pub fn view_cooldown(&self) -> Duration {
        Duration::seconds(self.tracker.view_cooldown_secs)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.tracker.categories.is_empty() {
            bail!("At least one category must be configured");
        }

        // Check codes and duplicates after canonicalizing
        let mut seen = HashSet::new();
        for code in &self.tracker.categories {
            validate_category_code(code)?;
            if !seen.insert(code.trim().to_ascii_uppercase()) {
                bail!("Duplicate category: '{}'", code.trim());
            }
        }

        if self.tracker.view_cooldown_secs < 0 {
            bail!(
                "view_cooldown_secs cannot be negative (got {})",
                self.tracker.view_cooldown_secs
            );
        }

        Ok(())
    }
}

/// Category codes are non-empty ASCII alphanumerics.
fn validate_category_code(code: &str) -> Result<()> {
    let code = code.trim();
    if code.is_empty() {
        bail!("Invalid category '': category code cannot be empty");
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("Invalid category '{code}': only ASCII letters and digits are allowed");
    }
    Ok(())
}
