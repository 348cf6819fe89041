//! Deal ingestion: one run fetches a category from the catalog and
//! replaces its stored rows in a single transaction.

pub mod error;
pub mod outcome;
pub mod pipeline;

pub use error::IngestError;
pub use outcome::{
    CollectingSink, IngestionOutcome, IngestionSummary, OutcomeSink, RecordedOutcome, RunPhase,
    TracingSink, Trigger,
};
pub use pipeline::{replace_category, run_ingestion, IngestContext, StorageTimeouts};
