//! One parameterized ingestion run: fetch a category from the catalog,
//! normalize it, and atomically replace its stored rows.

use std::time::Duration;

use chrono::Utc;
use dealsdb_catalog::{normalize_products, CatalogClient, RawProduct};
use dealsdb_core::{AffiliateLinkPolicy, AppConfig, CategoryNode};
use dealsdb_db::{replace_category_products, DbError};
use sqlx::PgPool;

use crate::error::IngestError;
use crate::outcome::{IngestionOutcome, IngestionSummary, RunPhase, Trigger};

/// Time bounds for the storage half of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageTimeouts {
    /// Applied to each SQL statement inside the transaction.
    pub statement: Duration,
    /// Applied to the whole transaction, acquisition through commit.
    pub transaction: Duration,
}

impl StorageTimeouts {
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self {
            statement: Duration::from_secs(secs),
            transaction: Duration::from_secs(secs),
        }
    }
}

/// Everything a run needs, shared by the scheduler, the manual trigger and
/// the CLI.
#[derive(Debug, Clone)]
pub struct IngestContext {
    pub pool: PgPool,
    pub catalog: CatalogClient,
    pub policy: AffiliateLinkPolicy,
    pub timeouts: StorageTimeouts,
}

impl IngestContext {
    /// Build a context from application config and an existing pool.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if `BB_API_KEY` is unset or the
    /// catalog client cannot be built from the configured base URL, timeout
    /// and user agent.
    pub fn from_app_config(pool: PgPool, config: &AppConfig) -> Result<Self, IngestError> {
        let api_key = config
            .require_catalog_api_key()
            .map_err(|e| IngestError::Config(e.to_string()))?;
        let catalog = CatalogClient::with_base_url(
            api_key,
            config.catalog_timeout_secs,
            &config.catalog_user_agent,
            &config.catalog_base_url,
        )
        .map_err(|e| IngestError::Config(e.to_string()))?;

        Ok(Self {
            pool,
            catalog,
            policy: config.affiliate_policy.clone(),
            timeouts: StorageTimeouts::from_secs(config.ingest_storage_timeout_secs),
        })
    }
}

/// Normalize `raw` and replace the stored rows of `storage_key` with it.
///
/// Returns the number of rows stored.
///
/// # Errors
///
/// - [`IngestError::Upstream`] if any product fails normalization; storage
///   is not touched.
/// - [`IngestError::Storage`] if the transaction fails or exceeds
///   `timeouts.transaction`; the previous rows are kept.
pub async fn replace_category(
    pool: &PgPool,
    storage_key: &str,
    raw: Vec<RawProduct>,
    policy: &AffiliateLinkPolicy,
    timeouts: StorageTimeouts,
) -> Result<u64, IngestError> {
    let records = normalize_products(raw, policy)?;
    let statement_timeout_ms = u64::try_from(timeouts.statement.as_millis()).unwrap_or(u64::MAX);

    // Dropping the timed-out future drops its transaction, which rolls back.
    let stored = tokio::time::timeout(
        timeouts.transaction,
        replace_category_products(pool, storage_key, &records, statement_timeout_ms),
    )
    .await
    .map_err(|_| {
        DbError::Timeout(format!(
            "replace exceeded {}ms",
            timeouts.transaction.as_millis()
        ))
    })??;

    Ok(stored)
}

/// Run one full ingestion for `node`.
///
/// Never fails: the result, success or error, is carried in the returned
/// [`IngestionOutcome`] for the caller to report.
pub async fn run_ingestion(
    ctx: &IngestContext,
    node: &CategoryNode,
    trigger: Trigger,
) -> IngestionOutcome {
    let started_at = Utc::now();
    let storage_key = node.storage_key.as_str();

    log_phase(storage_key, RunPhase::Idle, RunPhase::Fetching);
    let result = match ctx
        .catalog
        .fetch_category_products(&node.external_category_id)
        .await
    {
        Ok(raw) => {
            let fetched = raw.len();
            log_phase(storage_key, RunPhase::Fetching, RunPhase::Replacing);
            replace_category(&ctx.pool, storage_key, raw, &ctx.policy, ctx.timeouts)
                .await
                .map(|stored| IngestionSummary { fetched, stored })
                .inspect_err(|_| log_phase(storage_key, RunPhase::Replacing, RunPhase::Failed))
        }
        Err(e) => {
            log_phase(storage_key, RunPhase::Fetching, RunPhase::Failed);
            Err(IngestError::from(e))
        }
    };
    let from = if result.is_ok() {
        RunPhase::Replacing
    } else {
        RunPhase::Failed
    };
    log_phase(storage_key, from, RunPhase::Idle);

    IngestionOutcome {
        storage_key: node.storage_key.clone(),
        external_category_id: node.external_category_id.clone(),
        trigger,
        started_at,
        finished_at: Utc::now(),
        result,
    }
}

fn log_phase(storage_key: &str, from: RunPhase, to: RunPhase) {
    tracing::debug!(storage_key, %from, %to, "ingest: phase transition");
}
