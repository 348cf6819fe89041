use thiserror::Error;

/// Errors returned by the catalog client. Every variant is an upstream
/// failure from the point of view of an ingestion run.
///
/// URLs carried in these errors have the API key redacted.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by catalog API (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid catalog base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("invalid category filter '{external_category_id}': {reason}")]
    InvalidCategory {
        external_category_id: String,
        reason: String,
    },

    #[error("normalization error for sku {sku}: {reason}")]
    Normalization { sku: String, reason: String },
}
