//! Tracked categories
//!
//! Category codes are case-insensitive on input and canonical uppercase
//! internally. The accepted set comes from configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResetError;

/// Category set shipped by default.
pub const DEFAULT_CATEGORIES: &[&str] = &["M995", "BS", "AP", "SS198", "DVC12"];

/// A canonical (uppercase) category code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// The canonical code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn canonical(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of categories a deployment accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    codes: Vec<Category>,
}

impl CategorySet {
    /// Build a set from raw codes, canonicalizing each one.
    ///
    /// Duplicates (after upper-casing) are dropped, keeping first-seen order.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: Vec<Category> = Vec::new();
        for code in codes {
            let category = Category::canonical(code.as_ref());
            if !set.contains(&category) {
                set.push(category);
            }
        }
        Self { codes: set }
    }

    /// Resolve a user-supplied category string against the set.
    pub fn parse(&self, raw: &str) -> Result<Category, ResetError> {
        let candidate = Category::canonical(raw);
        if self.codes.contains(&candidate) {
            Ok(candidate)
        } else {
            Err(ResetError::InvalidCategory {
                input: raw.trim().to_string(),
                valid: self.to_string(),
            })
        }
    }

    /// Iterate over the accepted codes in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.codes.iter()
    }

    /// Number of accepted codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .codes
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}
