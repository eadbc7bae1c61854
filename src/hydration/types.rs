//! # Hydration Types
//!
//! Core types shared across the hydration engine: per-fetch outcomes, the
//! per-row result cache, and the read-only view a fetcher receives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::{ProviderError, RawRow};

/// Outcome of one hydrate fetch for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HydrateOutcome {
    /// Fetch succeeded with a value
    Success(RawRow),
    /// Fetch failed with an ignorable error, or returned no data; the
    /// branch "succeeds" with a null value and dependents still run
    Absent,
    /// Fetch failed fatally; direct and transitive dependents are skipped
    Failed(ProviderError),
    /// A dependency failed fatally; this fetch was never attempted
    Skipped,
}

impl HydrateOutcome {
    /// Whether dependents of this outcome must be skipped.
    pub fn poisons_dependents(&self) -> bool {
        matches!(self, HydrateOutcome::Failed(_) | HydrateOutcome::Skipped)
    }
}

/// Result of one hydrate fetch, produced at most once per (row, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrateResult {
    pub name: String,
    pub outcome: HydrateOutcome,
    /// Wall-clock duration of the fetch; zero for skipped results
    pub duration: Duration,
}

impl HydrateResult {
    pub fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: HydrateOutcome::Skipped,
            duration: Duration::default(),
        }
    }

    /// The fetched value, when the outcome was a success.
    pub fn value(&self) -> Option<&RawRow> {
        match &self.outcome {
            HydrateOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The fatal error, when there was one.
    pub fn error(&self) -> Option<&ProviderError> {
        match &self.outcome {
            HydrateOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.outcome, HydrateOutcome::Absent)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, HydrateOutcome::Skipped)
    }
}

/// How a row's hydration cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationStatus {
    /// Every scheduled wave ran
    Completed,
    /// Cancellation was observed between waves; later waves never started
    Aborted,
}

/// All hydrate results for one row, plus how the cycle ended
#[derive(Debug, Clone, PartialEq)]
pub struct RowHydration {
    pub results: HashMap<String, HydrateResult>,
    pub status: HydrationStatus,
}

impl RowHydration {
    pub fn result(&self, name: &str) -> Option<&HydrateResult> {
        self.results.get(name)
    }

    /// Successful value for a hydrate name, if any.
    pub fn value(&self, name: &str) -> Option<&RawRow> {
        self.results.get(name).and_then(HydrateResult::value)
    }

    pub fn is_complete(&self) -> bool {
        self.status == HydrationStatus::Completed
    }
}

/// Read-only view a fetcher receives: the base row plus every result
/// resolved in earlier waves.
///
/// Dependency values are addressed by hydrate name; an ignored-error
/// (absent) dependency reads as `None`, which is how a fetcher decides to
/// itself yield no data rather than call the provider.
#[derive(Debug, Clone)]
pub struct HydrateData {
    row: Arc<RawRow>,
    resolved: Arc<HashMap<String, HydrateResult>>,
}

impl HydrateData {
    pub fn new(row: Arc<RawRow>, resolved: Arc<HashMap<String, HydrateResult>>) -> Self {
        Self { row, resolved }
    }

    /// View with no resolved dependencies, for fetches that only need the row.
    pub fn for_row(row: Arc<RawRow>) -> Self {
        Self {
            row,
            resolved: Arc::new(HashMap::new()),
        }
    }

    pub fn row(&self) -> &RawRow {
        &self.row
    }

    /// String field of the base row.
    pub fn row_str(&self, field: &str) -> Option<&str> {
        self.row.get(field).and_then(Value::as_str)
    }

    pub fn result(&self, name: &str) -> Option<&HydrateResult> {
        self.resolved.get(name)
    }

    /// Successful value of a dependency, if any.
    pub fn value(&self, name: &str) -> Option<&RawRow> {
        self.resolved.get(name).and_then(HydrateResult::value)
    }
}
