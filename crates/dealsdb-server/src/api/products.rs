use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, unknown_storage_key, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct DealItem {
    sku: String,
    name: String,
    sale_price: Decimal,
    regular_price: Decimal,
    on_sale: bool,
    percent_savings: Decimal,
    dollar_savings: Decimal,
    image_url: Option<String>,
    affiliate_link: Option<String>,
    ingested_at: DateTime<Utc>,
}

impl From<dealsdb_db::DealProductRow> for DealItem {
    fn from(row: dealsdb_db::DealProductRow) -> Self {
        Self {
            sku: row.sku,
            name: row.name,
            sale_price: row.sale_price,
            regular_price: row.regular_price,
            on_sale: row.on_sale,
            percent_savings: row.percent_savings,
            dollar_savings: row.dollar_savings,
            image_url: row.image_url,
            affiliate_link: row.affiliate_link,
            ingested_at: row.ingested_at,
        }
    }
}

/// `GET /api/v1/products/{storage_key}`: current deals for one category,
/// best first. Keys not in the registry are rejected before any query runs.
pub(super) async fn list_category_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(storage_key): Path<String>,
) -> Result<Json<ApiResponse<Vec<DealItem>>>, ApiError> {
    if !state.registry.contains(&storage_key) {
        return Err(unknown_storage_key(req_id.0, &storage_key));
    }

    let rows = dealsdb_db::list_category_products(&state.pool, &storage_key)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(DealItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/products/all`: current deals for every root category,
/// keyed by storage key.
pub(super) async fn list_all_root_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<BTreeMap<String, Vec<DealItem>>>>, ApiError> {
    let keys: Vec<String> = state
        .registry
        .root_storage_keys()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect();

    let grouped = dealsdb_db::list_products_for_keys(&state.pool, &keys)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = grouped
        .into_iter()
        .map(|(key, rows)| (key, rows.into_iter().map(DealItem::from).collect()))
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
