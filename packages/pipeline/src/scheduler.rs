//! Scheduled pipeline runs using tokio-cron-scheduler.
//!
//! One cron job per process: each firing executes one orchestrator
//! run. Missed firings are skipped, not backfilled; an overlapping run
//! is tolerated because every pipeline write is idempotent.

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::orchestrator::Orchestrator;

/// Start the scheduled pipeline trigger.
///
/// `cron` is a six-field cron expression (seconds first), e.g.
/// `0 0 2 * * *` for 02:00 daily.
pub async fn start_scheduler(orchestrator: Arc<Orchestrator>, cron: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            let report = orchestrator.run().await;
            if !report.succeeded() {
                tracing::error!(?report, "scheduled pipeline run did not fully succeed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(cron, "pipeline schedule started");
    Ok(scheduler)
}
