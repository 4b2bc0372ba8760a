//! Scanner module - sweeps provider IDs against the catalog
//!
//! This module contains the pieces of a sweep:
//! - `fetcher`: HTTP lookups with retry and backoff
//! - `extractor`: pulls the provider record out of a catalog payload
//! - `coordinator`: bounded-concurrency run loop and accounting
//! - `service`: manual, streamed and scheduled entry points
//! - `progress`: live outcome lines and SSE framing

mod coordinator;
mod extractor;
mod fetcher;
mod probe;
mod progress;
mod retry;
mod service;
mod types;

pub use coordinator::{
    RunCounters, RunStatus, RunSummary, ScanCoordinator, UnitReport, DEFAULT_JOB_NAME,
};
pub use extractor::{classify_body, extract_provider, ExtractError};
pub use fetcher::{
    build_http_client, CatalogClient, ProviderFetcher, API_KEY_HEADER, PROVIDER_QUERY_PARAM,
};
pub use probe::{validate_filters, PageCount, CATALOG_FILTERS, PROBE_PAGE_SIZE};
pub use progress::{
    progress_channel, sse_frame, ProgressSender, ProgressStream, COMPLETION_LINE,
    SSE_CONTENT_TYPE,
};
pub use retry::{parse_retry_after, RetryPolicy, MAX_BACKOFF, RETRYABLE_STATUSES};
pub use service::{ScanAck, ScanService};
pub use types::{FetchOutcome, ProviderRecord, ScanRequest, TriggerKind};
