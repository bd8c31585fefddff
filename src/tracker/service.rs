//! Reset tracker service
//!
//! Ties the cycle engine, scope store and rate limiter together behind one
//! lock. Every operation samples "now" once from the injected clock and
//! threads that value through validation, storage and phase computation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ResetError;
use crate::tracker::category::{Category, CategorySet};
use crate::tracker::clock::{Clock, SystemClock};
use crate::tracker::config::TrackerConfig;
use crate::tracker::engine::{resolve, CycleInfo, TimeInput};
use crate::tracker::limiter::{Gate, RateLimiter};
use crate::tracker::store::{ActiveReset, ResetRecord, ScopeId, ScopeStore, UserRef};

/// Result of a stored submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// The record as stored
    pub record: ResetRecord,
    /// Phase at submission time
    pub cycle: CycleInfo,
    /// Whether the record was mirrored to the global state
    pub mirrored: bool,
}

/// Result of a stateless cycle check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Validated category
    pub category: Category,
    /// Phase at check time
    pub cycle: CycleInfo,
}

/// Everything visible to one scope at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeView {
    /// Time the view was computed at, for "time ago" rendering
    pub now: chrono::NaiveDateTime,
    /// Live entries keyed by category
    pub entries: BTreeMap<Category, ActiveReset>,
}

#[derive(Debug)]
struct TrackerState {
    store: ScopeStore,
    limiter: RateLimiter,
}

/// Thread-safe reset tracker shared by all front-end handlers.
pub struct ResetTracker {
    categories: CategorySet,
    clock: Arc<dyn Clock>,
    state: Mutex<TrackerState>,
}

impl ResetTracker {
    /// Create a tracker from configuration using the system clock.
    #[must_use]
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a tracker with an injected clock.
    #[must_use]
    pub fn with_clock(config: &TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            categories: config.category_set(),
            clock,
            state: Mutex::new(TrackerState {
                store: ScopeStore::new(config.source_scope()),
                limiter: RateLimiter::new(config.view_cooldown()),
            }),
        }
    }

    /// The accepted categories.
    #[must_use]
    pub const fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Validate and store a reported reset for `scope`.
    ///
    /// Nothing is written unless the category is known and the anchor lies
    /// within the live 80-minute window. Submissions are never rate limited.
    pub fn submit(
        &self,
        scope: &ScopeId,
        user: &UserRef,
        category: &str,
        input: &TimeInput,
    ) -> Result<Submission, ResetError> {
        let now = self.clock.now();
        let (category, cycle) = self
            .validate(category, input, now)
            .inspect_err(|e| warn!(scope = %scope, user = %user.id, error = %e, "Rejected reset submission"))?;

        let mut state = self.lock();
        let mirrored = state.store.is_source(scope);
        let record = state
            .store
            .upsert(scope, category, cycle.anchor, user.clone(), now);
        drop(state);

        info!(
            scope = %scope,
            category = %record.category,
            anchor = %record.anchor,
            user = %user.id,
            mirrored,
            "Stored reset"
        );

        Ok(Submission {
            record,
            cycle,
            mirrored,
        })
    }

    /// Compute the current cycle for raw input without storing anything.
    pub fn check(&self, category: &str, input: &TimeInput) -> Result<CycleReport, ResetError> {
        let now = self.clock.now();
        let (category, cycle) = self.validate(category, input, now)?;
        Ok(CycleReport { category, cycle })
    }

    /// Every live reset visible to `scope`, subject to the per-user cooldown.
    ///
    /// The cooldown is only consumed when the view has something to show.
    pub fn view(&self, scope: &ScopeId, user: &UserRef) -> Result<ScopeView, ResetError> {
        let now = self.clock.now();
        let mut state = self.lock();

        if let Gate::Denied { remaining_secs } = state.limiter.try_acquire(&user.id, now) {
            warn!(user = %user.id, remaining_secs, "View rate limited");
            return Err(ResetError::RateLimited { remaining_secs });
        }

        let entries = state.store.read(scope, now)?;
        state.limiter.commit(&user.id, now);
        drop(state);

        debug!(scope = %scope, user = %user.id, count = entries.len(), "Served reset view");
        Ok(ScopeView { now, entries })
    }

    /// The live reset for one category. Not rate limited.
    pub fn view_category(&self, scope: &ScopeId, category: &str) -> Result<ActiveReset, ResetError> {
        let now = self.clock.now();
        let category = self.categories.parse(category)?;
        let entry = self.lock().store.read_category(scope, &category, now)?;
        debug!(scope = %scope, category = %category, "Served category view");
        Ok(entry)
    }

    /// Current time according to the tracker's clock.
    #[must_use]
    pub fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    fn validate(
        &self,
        category: &str,
        input: &TimeInput,
        now: chrono::NaiveDateTime,
    ) -> Result<(Category, CycleInfo), ResetError> {
        let category = self.categories.parse(category)?;
        let cycle = resolve(input, now)?;
        Ok((category, cycle))
    }

    // State is only ever mutated by single inserts, so a poisoned lock still
    // holds consistent maps.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
