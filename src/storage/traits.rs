//! Storage traits and error types
//!
//! The scanner only talks to persistence through these two traits, so the
//! SQLite backend can be swapped for any upsert-capable row store.

use crate::scanner::{ProviderRecord, RunSummary};
use crate::storage::RunRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Whether an upsert created a row or overwrote one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Destination for extracted provider records
///
/// Upserts are keyed by `record.id`. Repeating an upsert must neither
/// duplicate the row nor fail. Implementations must accept concurrent
/// callers.
#[async_trait]
pub trait ProviderSink: Send + Sync {
    async fn upsert_provider(&self, record: &ProviderRecord) -> StorageResult<UpsertOutcome>;
}

/// Append-only log with one row per run
#[async_trait]
pub trait RunLog: Send + Sync {
    /// Appends a run summary and returns its row ID
    async fn append_run(&self, summary: &RunSummary) -> StorageResult<i64>;

    /// Most recent runs, newest first
    async fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
