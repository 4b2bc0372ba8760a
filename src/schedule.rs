//! Daily scheduled sweeps using tokio-cron-scheduler
//!
//! The scheduler is owned by whoever starts it and stopped explicitly.
//! Its single job runs the configured default range once a day, in UTC.

use crate::config::ScheduleConfig;
use crate::scanner::{RunSummary, ScanRequest, ScanService, TriggerKind};
use crate::SweepError;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Six-field cron expression for `hour:00:00` every day
pub fn daily_cron(hour: u32) -> String {
    format!("0 0 {} * * *", hour)
}

/// Request the daily job runs
pub fn scheduled_request(config: &ScheduleConfig) -> Result<ScanRequest, SweepError> {
    ScanRequest::new(config.start_id, config.end_id, TriggerKind::Scheduled)
}

fn schedule_error(e: impl std::fmt::Debug) -> SweepError {
    SweepError::Schedule(format!("{:?}", e))
}

/// Body of the daily job; skipped once the service is shutting down
pub async fn run_scheduled(service: &ScanService, request: ScanRequest) -> Option<RunSummary> {
    if service.is_shut_down() {
        tracing::info!("Scan service is shutting down, skipping scheduled sweep");
        return None;
    }

    tracing::info!(
        "Scheduled sweep starting for IDs {}..={}",
        request.start_id(),
        request.end_id()
    );
    let summary = service.run(request).await;
    tracing::info!(
        "Scheduled sweep finished: {} ({} processed, {} stored)",
        summary.status,
        summary.counters.processed,
        summary.counters.new_or_updated
    );

    Some(summary)
}

/// Running cron scheduler with the daily sweep registered
pub struct ScanScheduler {
    scheduler: JobScheduler,
}

impl ScanScheduler {
    /// Registers the daily job and starts the scheduler
    pub async fn start(service: ScanService, config: &ScheduleConfig) -> Result<Self, SweepError> {
        let request = scheduled_request(config)?;
        let scheduler = JobScheduler::new().await.map_err(schedule_error)?;

        let job = Job::new_async(daily_cron(config.hour).as_str(), move |_uuid, _lock| {
            let service = service.clone();
            let request = request.clone();
            Box::pin(async move {
                run_scheduled(&service, request).await;
            })
        })
        .map_err(schedule_error)?;

        scheduler.add(job).await.map_err(schedule_error)?;
        scheduler.start().await.map_err(schedule_error)?;

        tracing::info!(
            "Scheduler started (daily sweep of IDs {}..={} at {:02}:00 UTC)",
            config.start_id,
            config.end_id,
            config.hour
        );

        Ok(Self { scheduler })
    }

    /// Stops the scheduler; runs already in progress are left to the service
    pub async fn shutdown(mut self) -> Result<(), SweepError> {
        self.scheduler.shutdown().await.map_err(schedule_error)?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
