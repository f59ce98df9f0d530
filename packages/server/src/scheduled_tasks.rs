//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Preview reads already delete lazily; the sweep reclaims previews
//! whose owners never came back.

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::server::AppIngestion;

/// Start all scheduled tasks
pub async fn start_scheduler(ingestion: Arc<AppIngestion>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Expired-preview sweep - runs every 5 minutes
    let sweep_job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        let ingestion = ingestion.clone();
        Box::pin(async move {
            match ingestion.sweep_expired().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!("Preview sweep removed {} expired previews", removed);
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Preview sweep failed: {}", e),
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (preview sweep every 5 minutes)");
    Ok(scheduler)
}
