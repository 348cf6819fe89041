use axum::{
    extract::{Path, State},
    Extension, Json,
};
use dealsdb_ingest::Trigger;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{unknown_storage_key, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct FetchAndStoreResult {
    storage_key: String,
    external_category_id: String,
    fetched: usize,
    stored: u64,
}

/// `POST /api/v1/fetch-and-store/{category_id}/{storage_key}`: run one
/// ingestion now and wait for it.
///
/// `category_id` must equal the registry's external id for `storage_key`;
/// callers cannot point a storage key at an arbitrary catalog filter.
/// Failures are logged in full but surface only as a generic error.
pub(super) async fn fetch_and_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((category_id, storage_key)): Path<(String, String)>,
) -> Result<Json<ApiResponse<FetchAndStoreResult>>, ApiError> {
    let Some(node) = state.registry.resolve(&storage_key) else {
        return Err(unknown_storage_key(req_id.0, &storage_key));
    };

    if node.external_category_id != category_id {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("category id does not match storage key '{storage_key}'"),
        ));
    }

    tracing::info!(
        storage_key = %node.storage_key,
        request_id = %req_id.0,
        "ingest: manual run requested"
    );

    let outcome = dealsdb_ingest::run_ingestion(&state.ingest, node, Trigger::Manual).await;
    state.sink.report(&outcome);

    match outcome.result {
        Ok(summary) => Ok(Json(ApiResponse {
            data: FetchAndStoreResult {
                storage_key: outcome.storage_key,
                external_category_id: outcome.external_category_id,
                fetched: summary.fetched,
                stored: summary.stored,
            },
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(_) => Err(ApiError::new(
            req_id.0,
            "internal_error",
            "error fetching and storing products",
        )),
    }
}
