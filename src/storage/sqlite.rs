//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.
//! A single connection is shared behind a mutex; every upsert runs under the
//! lock, which makes concurrent writes to the same key atomic.

use crate::scanner::{ProviderRecord, RunCounters, RunStatus, RunSummary, TriggerKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    ProviderSink, RunLog, StorageError, StorageResult, UpsertOutcome,
};
use crate::storage::RunRecord;
use crate::SweepError;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SweepError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SweepError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SweepError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    // ===== Providers =====

    /// Inserts or overwrites a provider row keyed by `record.id`
    pub fn save_provider(&self, record: &ProviderRecord) -> StorageResult<UpsertOutcome> {
        let conn = self.conn()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM providers WHERE id = ?1)",
            params![record.id],
            |row| row.get(0),
        )?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO providers (id, name, area_code, extension, homepage, email, first_seen_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                area_code = excluded.area_code,
                extension = excluded.extension,
                homepage = excluded.homepage,
                email = excluded.email,
                updated_at = excluded.updated_at",
            params![
                record.id,
                record.name,
                record.area_code,
                record.extension,
                record.homepage,
                record.email,
                now
            ],
        )?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Gets a provider by ID
    pub fn provider(&self, id: i64) -> StorageResult<Option<ProviderRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, name, area_code, extension, homepage, email FROM providers WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProviderRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        area_code: row.get(2)?,
                        extension: row.get(3)?,
                        homepage: row.get(4)?,
                        email: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Counts stored providers
    pub fn provider_count(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM providers", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Log =====

    /// Appends a run summary
    pub fn insert_run(&self, summary: &RunSummary) -> StorageResult<i64> {
        let conn = self.conn()?;
        let c = &summary.counters;
        conn.execute(
            "INSERT INTO runs (job_name, trigger_kind, status, new_or_updated, timeouts, processed,
             not_found, malformed, http_errors, transport_errors, sink_errors,
             duration_seconds, started_at, finished_at, config_hash, new_providers)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                summary.job_name,
                summary.trigger_kind,
                summary.status,
                c.new_or_updated as i64,
                c.timeouts as i64,
                c.processed as i64,
                c.not_found as i64,
                c.malformed as i64,
                c.http_errors as i64,
                c.transport_errors as i64,
                c.sink_errors as i64,
                summary.duration_seconds,
                summary.started_at.to_rfc3339(),
                summary.finished_at.to_rfc3339(),
                summary.config_hash,
                c.new_providers as i64,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Gets a run by ID
    pub fn run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
            params![run_id],
            run_from_row,
        )
        .optional()?
        .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Most recent runs, newest first
    pub fn latest_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    /// Counts logged runs
    pub fn run_count(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

const RUN_COLUMNS: &str = "id, job_name, trigger_kind, status, new_or_updated, timeouts, processed,
    not_found, malformed, http_errors, transport_errors, sink_errors,
    duration_seconds, started_at, finished_at, config_hash, new_providers";

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    Ok(row.get::<_, i64>(idx)?.max(0) as u64)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        job_name: row.get(1)?,
        trigger_kind: row.get(2)?,
        status: row.get(3)?,
        counters: RunCounters {
            new_or_updated: count_column(row, 4)?,
            new_providers: count_column(row, 16)?,
            timeouts: count_column(row, 5)?,
            processed: count_column(row, 6)?,
            not_found: count_column(row, 7)?,
            malformed: count_column(row, 8)?,
            http_errors: count_column(row, 9)?,
            transport_errors: count_column(row, 10)?,
            sink_errors: count_column(row, 11)?,
        },
        duration_seconds: row.get(12)?,
        started_at: row.get(13)?,
        finished_at: row.get(14)?,
        config_hash: row.get(15)?,
    })
}

impl ToSql for RunStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_db_string()))
    }
}

impl FromSql for RunStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        RunStatus::from_db_string(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown run status '{}'", s).into()))
    }
}

impl ToSql for TriggerKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_db_string()))
    }
}

impl FromSql for TriggerKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        TriggerKind::from_db_string(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown trigger kind '{}'", s).into()))
    }
}

#[async_trait]
impl ProviderSink for SqliteStorage {
    async fn upsert_provider(&self, record: &ProviderRecord) -> StorageResult<UpsertOutcome> {
        self.save_provider(record)
    }
}

#[async_trait]
impl RunLog for SqliteStorage {
    async fn append_run(&self, summary: &RunSummary) -> StorageResult<i64> {
        self.insert_run(summary)
    }

    async fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        self.latest_runs(limit)
    }
}
