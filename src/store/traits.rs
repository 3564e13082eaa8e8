//! Record store trait and error types

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur while persisting records
///
/// Persistence failures are fatal for the whole job: the crawl's
/// crash-safety guarantee depends on every page landing on disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for record sinks
///
/// Implementations keep the working set in memory and rewrite the durable
/// sink on every mutation, so a crash at any point leaves at most the
/// in-flight page unpersisted and never a torn file.
pub trait RecordStore {
    /// All records currently in the working set, in persisted order
    fn records(&self) -> &[Record];

    /// Appends `new_records` and rewrites the sink durably
    fn append_and_flush(&mut self, new_records: Vec<Record>) -> StoreResult<()>;

    /// Drops records whose title has already been seen earlier in the
    /// sequence (first occurrence wins, order preserved), rewrites the
    /// sink, and returns the number removed. Idempotent.
    fn deduplicate_and_flush(&mut self) -> StoreResult<usize>;

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}
