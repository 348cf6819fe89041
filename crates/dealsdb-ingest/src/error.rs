use dealsdb_catalog::CatalogError;
use dealsdb_db::DbError;
use thiserror::Error;

/// Why an ingestion run failed.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The catalog request failed or returned data that could not be
    /// normalized.
    #[error("upstream error: {0}")]
    Upstream(#[from] CatalogError),

    /// The replace transaction failed or timed out and was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Short, stable label for logs and metrics fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
        }
    }
}
