//! Job handlers

use crate::jobs::context::JobContext;
use crate::jobs::types::IngestCycleJob;
use apalis::prelude::*;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run one ingestion cycle.
///
/// Jobs left over from a backlog (scheduled more than two intervals ago) are
/// dropped, the next tick covers them. A cycle that is skipped because another
/// one is still running is not an error.
pub async fn handle_ingest_cycle(
    job: IngestCycleJob,
    ctx: Data<Arc<JobContext>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let lag = Utc::now() - job.scheduled_for;
    if lag > ctx.max_job_lag {
        warn!(
            scheduled_for = %job.scheduled_for,
            lag_seconds = lag.num_seconds(),
            "IngestCycleJob: dropping stale job"
        );
        if let Some(ref metrics) = ctx.metrics {
            metrics.ingest_cycles_skipped_total.inc();
        }
        return Ok(());
    }

    debug!(scheduled_for = %job.scheduled_for, "IngestCycleJob: starting cycle");

    match ctx.cycle.run().await {
        Some(report) => {
            info!(
                source = report.kp.selected.map(|s| s.as_str()).unwrap_or("none"),
                kp_rows = report.kp.rows,
                failed_tasks = report.failed_tasks(),
                duration_ms = report.duration_ms,
                "IngestCycleJob: cycle finished"
            );
        }
        None => {
            debug!("IngestCycleJob: cycle skipped, previous cycle still running");
        }
    }

    Ok(())
}
