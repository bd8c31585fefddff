//! Scope store
//!
//! Holds the latest reset record per category for every scope, plus one
//! global record set mirrored from the designated source scope. Phase is
//! never stored: every read recomputes it against the caller's "now".
//!
//! Maps grow by distinct (scope, category) keys and are never evicted.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ResetError;
use crate::tracker::category::Category;
use crate::tracker::engine::{phase, CycleInfo};

/// Opaque tenant/group identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a user who reports or views resets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    /// Stable user id, used as the rate-limit key
    pub id: String,
    /// Display label, shown next to local records
    pub label: String,
}

impl UserRef {
    /// Build a user reference.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// The latest reported reset for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRecord {
    /// Category the reset applies to
    pub category: Category,
    /// Cycle start, minute resolution
    pub anchor: NaiveDateTime,
    /// Who reported it
    pub submitted_by: UserRef,
    /// When it was stored; display only
    pub recorded_at: NaiveDateTime,
}

/// Where a read result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Mirrored from the designated source scope; submitter is not shown
    Global,
    /// The caller's own scope; submitter is shown
    Local,
}

/// One visible record with its freshly computed phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveReset {
    /// The stored record
    pub record: ResetRecord,
    /// Phase at read time
    pub cycle: CycleInfo,
    /// Global or local
    pub provenance: Provenance,
}

type RecordMap = HashMap<Category, ResetRecord>;

/// In-memory per-scope reset state with one mirrored global copy.
#[derive(Debug)]
pub struct ScopeStore {
    source_scope: Option<ScopeId>,
    scopes: HashMap<ScopeId, RecordMap>,
    global: RecordMap,
}

impl ScopeStore {
    /// Create an empty store. Writes into `source_scope` are mirrored globally.
    #[must_use]
    pub fn new(source_scope: Option<ScopeId>) -> Self {
        Self {
            source_scope,
            scopes: HashMap::new(),
            global: HashMap::new(),
        }
    }

    /// The designated source scope, if any.
    #[must_use]
    pub const fn source_scope(&self) -> Option<&ScopeId> {
        self.source_scope.as_ref()
    }

    /// Whether writes into `scope` are mirrored to the global state.
    #[must_use]
    pub fn is_source(&self, scope: &ScopeId) -> bool {
        self.source_scope.as_ref() == Some(scope)
    }

    /// Store a record, replacing any previous one for `(scope, category)`.
    ///
    /// The anchor must already have been validated by the cycle engine.
    pub fn upsert(
        &mut self,
        scope: &ScopeId,
        category: Category,
        anchor: NaiveDateTime,
        submitted_by: UserRef,
        now: NaiveDateTime,
    ) -> ResetRecord {
        let record = ResetRecord {
            category: category.clone(),
            anchor,
            submitted_by,
            recorded_at: now,
        };

        if self.is_source(scope) {
            self.global.insert(category.clone(), record.clone());
        }
        self.scopes
            .entry(scope.clone())
            .or_default()
            .insert(category, record.clone());

        record
    }

    /// Every live record visible to `scope`, keyed by category.
    ///
    /// Once the global state holds anything, every scope sees only the global
    /// view; local submissions are hidden for all categories.
    pub fn read(
        &self,
        scope: &ScopeId,
        now: NaiveDateTime,
    ) -> Result<BTreeMap<Category, ActiveReset>, ResetError> {
        let (records, provenance) = self.visible(scope);
        let Some(records) = records.filter(|r| !r.is_empty()) else {
            return Err(ResetError::NoRecordsAtAll);
        };

        let live: BTreeMap<_, _> = records
            .values()
            .filter_map(|record| live_entry(record, provenance, now))
            .map(|entry| (entry.record.category.clone(), entry))
            .collect();

        if live.is_empty() {
            Err(ResetError::NoActiveRecords)
        } else {
            Ok(live)
        }
    }

    /// The live record for one category, using the same selection rule as
    /// [`ScopeStore::read`].
    pub fn read_category(
        &self,
        scope: &ScopeId,
        category: &Category,
        now: NaiveDateTime,
    ) -> Result<ActiveReset, ResetError> {
        let (records, provenance) = self.visible(scope);
        let record = records
            .and_then(|r| r.get(category))
            .ok_or(ResetError::NoRecordsAtAll)?;
        live_entry(record, provenance, now).ok_or(ResetError::NoActiveRecords)
    }

    /// Number of categories currently held in the global state.
    #[must_use]
    pub fn global_len(&self) -> usize {
        self.global.len()
    }

    fn visible(&self, scope: &ScopeId) -> (Option<&RecordMap>, Provenance) {
        if self.global.is_empty() {
            (self.scopes.get(scope), Provenance::Local)
        } else {
            (Some(&self.global), Provenance::Global)
        }
    }
}

fn live_entry(record: &ResetRecord, provenance: Provenance, now: NaiveDateTime) -> Option<ActiveReset> {
    phase(record.anchor, now).map(|cycle| ActiveReset {
        record: record.clone(),
        cycle,
        provenance,
    })
}
