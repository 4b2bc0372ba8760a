//! Entry points for triggering sweeps
//!
//! Every run started here gets a child of the service's cancellation token,
//! so [`ScanService::shutdown`] stops all of them between dispatches.

use crate::scanner::coordinator::{RunSummary, ScanCoordinator};
use crate::scanner::progress::{progress_channel, ProgressStream};
use crate::scanner::types::{ScanRequest, TriggerKind};
use crate::SweepError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Shared handle for starting runs
#[derive(Clone)]
pub struct ScanService {
    coordinator: Arc<ScanCoordinator>,
    shutdown: CancellationToken,
}

/// Acknowledgement for a run started in the background
#[derive(Debug)]
pub struct ScanAck {
    pub start_id: i64,
    pub end_id: i64,
    pub trigger_kind: TriggerKind,
    handle: JoinHandle<RunSummary>,
}

impl ScanAck {
    /// The immediate confirmation line
    pub fn message(&self) -> String {
        format!(
            "Processing started for provider IDs {} to {}.",
            self.start_id, self.end_id
        )
    }

    /// Waits for the background run to finish
    pub async fn wait(self) -> Result<RunSummary, SweepError> {
        Ok(self.handle.await?)
    }
}

impl ScanService {
    pub fn new(coordinator: ScanCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            shutdown: CancellationToken::new(),
        }
    }

    /// Runs a sweep and waits for its summary
    pub async fn run(&self, request: ScanRequest) -> RunSummary {
        let cancel = self.shutdown.child_token();
        self.coordinator.run_with(&request, None, &cancel).await
    }

    /// Starts a manual sweep in the background and returns at once
    ///
    /// The summary lands in the run log; [`ScanAck::wait`] is optional.
    pub fn trigger_manual(&self, start_id: i64, end_id: i64) -> Result<ScanAck, SweepError> {
        let request = ScanRequest::new(start_id, end_id, TriggerKind::Manual)?;
        let coordinator = self.coordinator.clone();
        let cancel = self.shutdown.child_token();

        let handle = tokio::spawn(async move {
            coordinator.run_with(&request, None, &cancel).await
        });

        tracing::info!("Manual sweep queued for IDs {}..={}", start_id, end_id);

        Ok(ScanAck {
            start_id,
            end_id,
            trigger_kind: TriggerKind::Manual,
            handle,
        })
    }

    /// Starts a manual sweep whose outcome lines feed the returned stream
    ///
    /// Each call is a separate run. Dropping the stream does not stop it.
    pub fn stream(&self, start_id: i64, end_id: i64) -> Result<ProgressStream, SweepError> {
        let request = ScanRequest::new(start_id, end_id, TriggerKind::Manual)?;
        let coordinator = self.coordinator.clone();
        let cancel = self.shutdown.child_token();
        let (sender, stream) = progress_channel();

        tokio::spawn(async move {
            coordinator.run_with(&request, Some(sender), &cancel).await;
        });

        Ok(stream)
    }

    /// Cancels every run started through this service
    pub fn shutdown(&self) {
        tracing::info!("Shutting down scan service");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
