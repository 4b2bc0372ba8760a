//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Provider-Sweep database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Providers, keyed by the ID found inside the catalog record
CREATE TABLE IF NOT EXISTS providers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    area_code TEXT,
    extension TEXT,
    homepage TEXT,
    email TEXT,
    first_seen_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- One row per sweep, append-only
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_name TEXT NOT NULL,
    trigger_kind TEXT NOT NULL,
    status TEXT NOT NULL,
    new_or_updated INTEGER NOT NULL,
    new_providers INTEGER NOT NULL DEFAULT 0,
    timeouts INTEGER NOT NULL,
    processed INTEGER NOT NULL,
    not_found INTEGER NOT NULL DEFAULT 0,
    malformed INTEGER NOT NULL DEFAULT 0,
    http_errors INTEGER NOT NULL DEFAULT 0,
    transport_errors INTEGER NOT NULL DEFAULT 0,
    sink_errors INTEGER NOT NULL DEFAULT 0,
    duration_seconds REAL NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_finished ON runs(finished_at);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
