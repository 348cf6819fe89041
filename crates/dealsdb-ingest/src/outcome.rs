use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::IngestError;

/// What started an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    Manual,
    Cli,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Manual => write!(f, "manual"),
            Trigger::Cli => write!(f, "cli"),
        }
    }
}

/// Where a run for one storage key currently is.
///
/// `Idle -> Fetching -> Replacing -> Idle` on success, or
/// `Idle -> Fetching -> Failed -> Idle` when either step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Replacing,
    Failed,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Fetching => write!(f, "fetching"),
            RunPhase::Replacing => write!(f, "replacing"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Counts for a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    /// Products returned by the catalog.
    pub fetched: usize,
    /// Rows now stored under the storage key.
    pub stored: u64,
}

/// Result of one ingestion run. Transient: reported, never persisted.
#[derive(Debug)]
pub struct IngestionOutcome {
    pub storage_key: String,
    pub external_category_id: String,
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: Result<IngestionSummary, IngestError>,
}

impl IngestionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Receives every finished run.
pub trait OutcomeSink: Send + Sync {
    fn report(&self, outcome: &IngestionOutcome);
}

/// Logs outcomes: `info` on success, `error` with the cause on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn report(&self, outcome: &IngestionOutcome) {
        match &outcome.result {
            Ok(summary) => tracing::info!(
                storage_key = %outcome.storage_key,
                trigger = %outcome.trigger,
                fetched = summary.fetched,
                stored = summary.stored,
                duration_ms = outcome.duration_ms(),
                "ingest: run succeeded"
            ),
            Err(e) => tracing::error!(
                storage_key = %outcome.storage_key,
                external_category_id = %outcome.external_category_id,
                trigger = %outcome.trigger,
                kind = e.kind(),
                error = %e,
                duration_ms = outcome.duration_ms(),
                "ingest: run failed"
            ),
        }
    }
}

/// A reported outcome with the error flattened to its kind and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome {
    pub storage_key: String,
    pub trigger: Trigger,
    pub summary: Option<IngestionSummary>,
    pub error_kind: Option<&'static str>,
    pub error: Option<String>,
}

/// Keeps every reported outcome in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    outcomes: Mutex<Vec<RecordedOutcome>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far, in report order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<RecordedOutcome> {
        match self.outcomes.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OutcomeSink for CollectingSink {
    fn report(&self, outcome: &IngestionOutcome) {
        let recorded = RecordedOutcome {
            storage_key: outcome.storage_key.clone(),
            trigger: outcome.trigger,
            summary: outcome.result.as_ref().ok().copied(),
            error_kind: outcome.result.as_ref().err().map(IngestError::kind),
            error: outcome.result.as_ref().err().map(ToString::to_string),
        };
        match self.outcomes.lock() {
            Ok(mut guard) => guard.push(recorded),
            Err(poisoned) => poisoned.into_inner().push(recorded),
        }
    }
}
