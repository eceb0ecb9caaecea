//! Cron-based scheduler for enqueuing ingestion cycles

use crate::jobs::types::IngestCycleJob;
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Cron expression (with seconds field) firing every `interval_seconds`.
///
/// Cron steps restart at each minute, hour or day boundary, so only intervals
/// that divide that boundary evenly tick at a fixed spacing. Anything else
/// returns `None`.
pub fn cron_expression(interval_seconds: u64) -> Option<String> {
    let divides = |step: u64, period: u64| step > 0 && period % step == 0;

    if interval_seconds < 60 {
        divides(interval_seconds, 60).then(|| format!("*/{} * * * * *", interval_seconds))
    } else if interval_seconds < 3600 {
        let minutes = interval_seconds / 60;
        (interval_seconds % 60 == 0 && divides(minutes, 60)).then(|| format!("0 */{} * * * *", minutes))
    } else {
        let hours = interval_seconds / 3600;
        (interval_seconds % 3600 == 0 && divides(hours, 24)).then(|| format!("0 0 */{} * * *", hours))
    }
}

/// Enqueues an IngestCycleJob on every cron tick
pub struct JobScheduler {
    storage: Arc<RedisStorage<IngestCycleJob>>,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl JobScheduler {
    pub fn new(
        storage: Arc<RedisStorage<IngestCycleJob>>,
        interval_seconds: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if interval_seconds == 0 {
            return Err("Scheduler disabled: interval_seconds is 0".into());
        }

        let Some(cron_expr) = cron_expression(interval_seconds) else {
            return Err(format!(
                "Unsupported ingestion interval {}s: must evenly divide a minute, an hour or a day",
                interval_seconds
            )
            .into());
        };
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid cron expression '{}': {}", cron_expr, e),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            "JobScheduler: created with interval {}s (cron: {})",
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            storage,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let storage = self.storage.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("JobScheduler: started, waiting for cron schedule...");

            loop {
                let Some(next_tick) = schedule.upcoming(chrono::Utc).next() else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                };
                let now = chrono::Utc::now();
                if next_tick > now {
                    let duration = (next_tick - now).to_std().unwrap_or_default();
                    tokio::time::sleep(duration).await;
                }

                let mut storage_clone = (*storage).clone();
                match storage_clone.push(IngestCycleJob::new(next_tick)).await {
                    Ok(_) => {
                        debug!(scheduled_for = %next_tick, "JobScheduler: enqueued IngestCycleJob");
                    }
                    Err(e) => {
                        error!(error = %e, "JobScheduler: failed to enqueue IngestCycleJob");
                    }
                }
            }
        });

        *self.handle.write().await = Some(handle);

        info!("JobScheduler: started successfully");
        Ok(())
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("JobScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
