//! Provider-Sweep: a bounded-concurrency catalog scanner
//!
//! This crate sweeps a range of numeric provider IDs against a read-only
//! catalog API, extracts the nested provider record for each ID that has one,
//! upserts it into a local store, and records a summary of every run.

pub mod config;
pub mod output;
pub mod scanner;
pub mod schedule;
pub mod storage;

use thiserror::Error;

/// Main error type for Provider-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Catalog returned HTTP {status} for {url}")]
    CatalogStatus { url: String, status: u16 },

    #[error("Unexpected catalog payload: {0}")]
    Payload(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid scan range: end ID {end_id} is below start ID {start_id}")]
    InvalidRange { start_id: i64, end_id: i64 },

    #[error("Unknown catalog filter: {0}")]
    UnknownFilter(String),

    #[error("Scheduler error: {0}")]
    Schedule(String),

    #[error("Background scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Provider-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use scanner::{
    FetchOutcome, ProviderRecord, RunCounters, RunStatus, RunSummary, ScanCoordinator,
    ScanRequest, ScanService, TriggerKind,
};
pub use storage::SqliteStorage;
