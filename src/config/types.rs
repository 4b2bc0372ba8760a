use serde::Deserialize;
use std::time::Duration;

/// Catalog endpoint used when the config does not name one
pub const DEFAULT_BASE_URL: &str =
    "https://rest.arbeitsagentur.de/infosysbub/wbsuche/pc/v2/bildungsangebot";

/// Main configuration structure for Provider-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub output: OutputConfig,
}

/// Catalog API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Endpoint queried with `?ban=<id>`
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Value sent in the `X-API-Key` header
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Timeout for a single request attempt (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Worker pool and retry settings
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Maximum number of IDs processed at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Total attempts per ID, including the first one
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// First backoff delay; doubles with every further retry (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry_attempts: default_retry_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

/// Daily scheduled sweep
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hour of day (UTC) at which the sweep starts
    #[serde(default = "default_hour")]
    pub hour: u32,

    #[serde(rename = "start-id", default = "default_start_id")]
    pub start_id: i64,

    #[serde(rename = "end-id", default = "default_end_id")]
    pub end_id: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_hour(),
            start_id: default_start_id(),
            end_id: default_end_id(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_concurrency() -> u32 {
    20
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_hour() -> u32 {
    3
}

fn default_start_id() -> i64 {
    1000
}

fn default_end_id() -> i64 {
    2000
}
