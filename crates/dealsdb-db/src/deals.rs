use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dealsdb_core::ProductRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `deal_products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealProductRow {
    pub storage_key: String,
    pub sku: String,
    pub name: String,
    pub sale_price: Decimal,
    pub on_sale: bool,
    pub percent_savings: Decimal,
    pub dollar_savings: Decimal,
    pub regular_price: Decimal,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

// Postgres caps `statement_timeout` at `INT_MAX` milliseconds.
const MAX_STATEMENT_TIMEOUT_MS: u64 = 2_147_483_647;

const SELECT_COLUMNS: &str = "storage_key, sku, name, sale_price, on_sale, percent_savings, \
     dollar_savings, regular_price, image_url, affiliate_link, ingested_at";

// ---------------------------------------------------------------------------
// Ingestion transaction
// ---------------------------------------------------------------------------

/// Replace the full row set of `storage_key` with `records`.
///
/// Runs in one transaction:
///
/// 1. bound every statement with `statement_timeout_ms`;
/// 2. take a transaction-scoped advisory lock on the storage key, so two
///    runs for the same key serialize while other keys proceed;
/// 3. delete every existing row for the key;
/// 4. insert each record;
/// 5. commit.
///
/// On any error the transaction is dropped without commit, which rolls it
/// back: readers keep seeing the previous row set, or no rows on a first
/// run. Returns the number of rows inserted.
///
/// # Errors
///
/// - [`DbError::Timeout`] if pool acquisition or a statement times out.
/// - [`DbError::Sqlx`] on any other failure, including a duplicate sku
///   within `records`.
pub async fn replace_category_products(
    pool: &PgPool,
    storage_key: &str,
    records: &[ProductRecord],
    statement_timeout_ms: u64,
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('statement_timeout', $1, true)")
        .bind(statement_timeout_ms.min(MAX_STATEMENT_TIMEOUT_MS).to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(storage_key)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM deal_products WHERE storage_key = $1")
        .bind(storage_key)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut inserted = 0u64;
    for record in records {
        inserted += sqlx::query(
            "INSERT INTO deal_products \
                 (storage_key, sku, name, sale_price, on_sale, percent_savings, \
                  dollar_savings, regular_price, image_url, affiliate_link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(storage_key)
        .bind(&record.sku)
        .bind(&record.name)
        .bind(record.sale_price)
        .bind(record.on_sale)
        .bind(record.percent_savings)
        .bind(record.dollar_savings)
        .bind(record.regular_price)
        .bind(&record.image_url)
        .bind(&record.affiliate_link)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;

    tracing::debug!(
        storage_key,
        deleted,
        inserted,
        "deals: replaced category products"
    );

    Ok(inserted)
}

// ---------------------------------------------------------------------------
// Read queries
// ---------------------------------------------------------------------------

/// List the current rows for one storage key, best deals first.
///
/// Ties on `percent_savings` are broken by `sku` so the order is stable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_category_products(
    pool: &PgPool,
    storage_key: &str,
) -> Result<Vec<DealProductRow>, DbError> {
    let rows = sqlx::query_as::<_, DealProductRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM deal_products \
         WHERE storage_key = $1 \
         ORDER BY percent_savings DESC, sku"
    ))
    .bind(storage_key)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List the current rows for several storage keys at once, grouped by key.
///
/// Every requested key is present in the result; keys with no rows map to
/// an empty list. Each list is ordered as in [`list_category_products`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_for_keys(
    pool: &PgPool,
    storage_keys: &[String],
) -> Result<BTreeMap<String, Vec<DealProductRow>>, DbError> {
    let rows = sqlx::query_as::<_, DealProductRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM deal_products \
         WHERE storage_key = ANY($1) \
         ORDER BY storage_key, percent_savings DESC, sku"
    ))
    .bind(storage_keys)
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<String, Vec<DealProductRow>> = storage_keys
        .iter()
        .map(|key| (key.clone(), Vec::new()))
        .collect();
    for row in rows {
        grouped.entry(row.storage_key.clone()).or_default().push(row);
    }

    Ok(grouped)
}

/// Count the current rows for one storage key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_category_products(pool: &PgPool, storage_key: &str) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deal_products WHERE storage_key = $1",
    )
    .bind(storage_key)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
