//! Run reporter
//!
//! Appends one summary per finished run to the run log. A failed append is
//! the caller's to log; it never changes how the run itself ended.

use crate::scanner::RunSummary;
use crate::storage::{RunLog, StorageResult};
use std::sync::Arc;

/// Writes run summaries to a [`RunLog`]
#[derive(Clone)]
pub struct RunReporter {
    log: Arc<dyn RunLog>,
}

impl RunReporter {
    pub fn new(log: Arc<dyn RunLog>) -> Self {
        Self { log }
    }

    /// Appends `summary` and returns the new run ID
    pub async fn report(&self, summary: &RunSummary) -> StorageResult<i64> {
        let run_id = self.log.append_run(summary).await?;

        tracing::info!(
            "Recorded run {} ({}, {} trigger, {} processed)",
            run_id,
            summary.status,
            summary.trigger_kind,
            summary.counters.processed
        );

        Ok(run_id)
    }
}
