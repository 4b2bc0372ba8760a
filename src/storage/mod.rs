//! Storage module for persisting sweep results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent provider upserts
//! - The append-only run log

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ProviderSink, RunLog, StorageError, StorageResult, UpsertOutcome};

use crate::scanner::{RunCounters, RunStatus, TriggerKind};
use crate::SweepError;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SweepError> {
    SqliteStorage::new(path)
}

/// Represents a logged run in the database
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub job_name: String,
    pub trigger_kind: TriggerKind,
    pub status: RunStatus,
    pub counters: RunCounters,
    pub duration_seconds: f64,
    pub started_at: String,
    pub finished_at: String,
    pub config_hash: Option<String>,
}
