//! Scan coordinator - run orchestration and accounting
//!
//! One unit of work per ID: fetch, extract and, on success, upsert into the
//! sink. Units run in a pool of fixed width and finish in any order. Each unit
//! hands back an immutable [`UnitReport`]; the completion loop in
//! [`ScanCoordinator::run_with`] is the only place that writes
//! [`RunCounters`].

use crate::config::Config;
use crate::output::RunReporter;
use crate::scanner::fetcher::{CatalogClient, ProviderFetcher};
use crate::scanner::progress::ProgressSender;
use crate::scanner::retry::RetryPolicy;
use crate::scanner::types::{FetchOutcome, ScanRequest, TriggerKind};
use crate::storage::{ProviderSink, SqliteStorage, UpsertOutcome};
use crate::SweepError;
use chrono::{DateTime, Utc};
use futures::future;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Job name recorded in the run log
pub const DEFAULT_JOB_NAME: &str = "provider_sweep";

/// Per-run tallies
///
/// `new_or_updated`, `timeouts` and `processed` are the headline counters.
/// `new_providers` is the share of `new_or_updated` that was not stored
/// before; the rest break down the IDs that produced nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub new_or_updated: u64,
    pub new_providers: u64,
    pub timeouts: u64,
    pub processed: u64,
    pub not_found: u64,
    pub malformed: u64,
    pub http_errors: u64,
    pub transport_errors: u64,
    pub sink_errors: u64,
}

impl RunCounters {
    /// Folds one finished unit into the tallies
    pub fn record(&mut self, report: &UnitReport) {
        self.processed += 1;

        match &report.outcome {
            FetchOutcome::Success(_) => match &report.sink {
                Some(Ok(upsert)) => {
                    self.new_or_updated += 1;
                    if *upsert == UpsertOutcome::Inserted {
                        self.new_providers += 1;
                    }
                }
                _ => self.sink_errors += 1,
            },
            FetchOutcome::NotFound => self.not_found += 1,
            FetchOutcome::MalformedPayload => self.malformed += 1,
            FetchOutcome::HttpError(_) => self.http_errors += 1,
            FetchOutcome::Timeout => self.timeouts += 1,
            FetchOutcome::Transport(_) => self.transport_errors += 1,
        }
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Completed,
    /// At least one ID timed out. No other failure kind leads here.
    CompletedWithErrors,
    /// Stopped through the cancellation token before every ID was dispatched
    Cancelled,
}

impl RunStatus {
    pub fn from_counters(counters: &RunCounters, cancelled: bool) -> Self {
        if cancelled {
            Self::Cancelled
        } else if counters.timeouts > 0 {
            Self::CompletedWithErrors
        } else {
            Self::Completed
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "completed_with_errors" => Some(Self::CompletedWithErrors),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Final account of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub job_name: String,
    pub counters: RunCounters,
    pub duration_seconds: f64,
    pub status: RunStatus,
    pub trigger_kind: TriggerKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,
}

/// Result of one unit of work
#[derive(Debug, Clone)]
pub struct UnitReport {
    /// ID the unit was dispatched for
    pub scanned_id: i64,
    pub outcome: FetchOutcome,
    /// Sink result, present only for `Success`
    pub sink: Option<Result<UpsertOutcome, String>>,
}

impl fmt::Display for UnitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.scanned_id;
        match (&self.outcome, &self.sink) {
            (FetchOutcome::Success(_), Some(Ok(_))) => {
                write!(f, "Provider ID {}: data processed successfully.", id)
            }
            (FetchOutcome::Success(record), Some(Err(reason))) => write!(
                f,
                "Provider ID {}: provider {} could not be stored ({}).",
                id, record.id, reason
            ),
            (FetchOutcome::Success(record), None) => {
                write!(f, "Provider ID {}: provider {} was not stored.", id, record.id)
            }
            (FetchOutcome::NotFound, _) => write!(f, "Provider ID {}: no data found.", id),
            (FetchOutcome::MalformedPayload, _) => {
                write!(f, "Provider ID {}: no valid data found.", id)
            }
            (FetchOutcome::HttpError(status), _) => write!(
                f,
                "Provider ID {}: error fetching data (status code: {}).",
                id, status
            ),
            (FetchOutcome::Timeout, _) => write!(f, "Provider ID {}: timeout.", id),
            (FetchOutcome::Transport(reason), _) => {
                write!(f, "Provider ID {}: connection failed ({}).", id, reason)
            }
        }
    }
}

/// Drives a sweep over an ID range
pub struct ScanCoordinator {
    fetcher: Arc<dyn ProviderFetcher>,
    sink: Arc<dyn ProviderSink>,
    reporter: RunReporter,
    concurrency: usize,
    job_name: String,
    config_hash: Option<String>,
}

impl ScanCoordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Looks up single IDs
    /// * `sink` - Receives every extracted provider record
    /// * `reporter` - Persists the run summary
    /// * `concurrency` - Pool width; at most this many units are in flight
    pub fn new(
        fetcher: Arc<dyn ProviderFetcher>,
        sink: Arc<dyn ProviderSink>,
        reporter: RunReporter,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            sink,
            reporter,
            concurrency: concurrency.max(1),
            job_name: DEFAULT_JOB_NAME.to_string(),
            config_hash: None,
        }
    }

    /// Wires the catalog client and a SQLite store from configuration
    pub fn from_config(
        config: &Config,
        config_hash: Option<String>,
        storage: Arc<SqliteStorage>,
    ) -> Result<Self, SweepError> {
        let policy = RetryPolicy::from_config(&config.scanner);
        let client = CatalogClient::new(&config.catalog, policy)?;

        Ok(Self::new(
            Arc::new(client),
            storage.clone(),
            RunReporter::new(storage),
            config.scanner.concurrency as usize,
        )
        .with_config_hash(config_hash))
    }

    pub fn with_config_hash(mut self, config_hash: Option<String>) -> Self {
        self.config_hash = config_hash;
        self
    }

    /// Runs a sweep to completion without progress or cancellation
    pub async fn run(&self, request: &ScanRequest) -> RunSummary {
        self.run_with(request, None, &CancellationToken::new()).await
    }

    /// Runs a sweep
    ///
    /// Every outcome line is forwarded to `progress` when given, followed by
    /// the completion line once the summary has been reported. `cancel` is
    /// checked before each ID is dispatched; units already in flight finish.
    pub async fn run_with(
        &self,
        request: &ScanRequest,
        progress: Option<ProgressSender>,
        cancel: &CancellationToken,
    ) -> RunSummary {
        let started_at = Utc::now();
        let clock = Instant::now();

        tracing::info!(
            "Starting {} run for provider IDs {}..={} ({} IDs, {} workers)",
            request.trigger_kind(),
            request.start_id(),
            request.end_id(),
            request.len(),
            self.concurrency
        );

        let mut counters = RunCounters::default();

        let mut units = stream::iter(request.ids())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|id| self.process_unit(id))
            .buffer_unordered(self.concurrency);

        while let Some(report) = units.next().await {
            counters.record(&report);

            let line = report.to_string();
            tracing::info!("{}", line);
            if let Some(progress) = &progress {
                progress.send(line);
            }

            if counters.processed % 100 == 0 {
                let rate = counters.processed as f64 / clock.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {}/{} IDs processed, {} stored, {} timeouts, {:.2} IDs/sec",
                    counters.processed,
                    request.len(),
                    counters.new_or_updated,
                    counters.timeouts,
                    rate
                );
            }
        }

        let cancelled = counters.processed < request.len() && cancel.is_cancelled();
        let summary = RunSummary {
            job_name: self.job_name.clone(),
            counters,
            duration_seconds: clock.elapsed().as_secs_f64(),
            status: RunStatus::from_counters(&counters, cancelled),
            trigger_kind: request.trigger_kind(),
            started_at,
            finished_at: Utc::now(),
            config_hash: self.config_hash.clone(),
        };

        if cancelled {
            tracing::warn!(
                "Run cancelled after {} of {} IDs",
                counters.processed,
                request.len()
            );
        }

        tracing::info!(
            "Run finished with status {}: {} processed, {} stored, {} timeouts in {:.1}s",
            summary.status,
            counters.processed,
            counters.new_or_updated,
            counters.timeouts,
            summary.duration_seconds
        );

        if let Err(e) = self.reporter.report(&summary).await {
            tracing::error!("Failed to record run summary: {}", e);
        }

        if let Some(progress) = progress {
            progress.finish();
        }

        summary
    }

    /// Fetch, extract and store a single ID
    async fn process_unit(&self, scanned_id: i64) -> UnitReport {
        let outcome = self.fetcher.fetch(scanned_id).await;

        let sink = match &outcome {
            FetchOutcome::Success(record) => {
                if record.id != scanned_id {
                    tracing::debug!(
                        "Provider ID {} returned record for provider {}",
                        scanned_id,
                        record.id
                    );
                }

                let result = self.sink.upsert_provider(record).await;
                if let Err(e) = &result {
                    tracing::warn!("Failed to store provider {}: {}", record.id, e);
                }
                Some(result.map_err(|e| e.to_string()))
            }
            _ => None,
        };

        UnitReport {
            scanned_id,
            outcome,
            sink,
        }
    }
}
