//! Statistics from the sweep database
//!
//! This module provides functionality for extracting and displaying
//! run history and provider totals from the storage layer.

use crate::storage::{RunLog, RunRecord, SqliteStorage};
use crate::SweepError;

/// Sweep statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Providers currently stored
    pub total_providers: u64,

    /// Runs ever logged
    pub total_runs: u64,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl RunStatistics {
    /// Share of processed IDs across the recent runs that yielded a stored provider
    pub fn hit_rate(&self) -> f64 {
        let (stored, processed) = self.recent_runs.iter().fold((0u64, 0u64), |acc, run| {
            (
                acc.0 + run.counters.new_or_updated,
                acc.1 + run.counters.processed,
            )
        });

        if processed > 0 {
            (stored as f64 / processed as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `limit` - How many recent runs to include
pub async fn load_statistics(
    storage: &SqliteStorage,
    limit: usize,
) -> Result<RunStatistics, SweepError> {
    Ok(RunStatistics {
        total_providers: storage.provider_count()?,
        total_runs: storage.run_count()?,
        recent_runs: storage.recent_runs(limit).await?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Sweep Statistics ===\n");

    println!("Overview:");
    println!("  Providers stored: {}", stats.total_providers);
    println!("  Runs logged: {}", stats.total_runs);
    println!();

    if stats.recent_runs.is_empty() {
        println!("No runs recorded yet.");
        return;
    }

    println!("Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        let c = &run.counters;
        println!(
            "  #{} {} [{}] {} - {} processed, {} stored ({} new), {} timeouts, {:.1}s",
            run.id,
            run.started_at,
            run.trigger_kind,
            run.status,
            c.processed,
            c.new_or_updated,
            c.new_providers,
            c.timeouts,
            run.duration_seconds
        );

        let failures = c.not_found + c.malformed + c.http_errors + c.transport_errors + c.sink_errors;
        if failures > 0 {
            println!(
                "      not found: {}, malformed: {}, http: {}, transport: {}, sink: {}",
                c.not_found, c.malformed, c.http_errors, c.transport_errors, c.sink_errors
            );
        }
    }
    println!();

    println!("Hit Rate: {:.1}% of processed IDs stored", stats.hit_rate());
}
