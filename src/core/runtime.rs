//! Apalis worker setup for ingestion jobs

use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::IngestCycleJob;
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use tracing::info;

pub const WORKER_NAME: &str = "ingest-cycle-worker";

/// Runs the single ingestion worker. Cycles are non-reentrant, so one
/// worker consuming the queue is enough.
pub struct IngestRuntime {
    job_context: Arc<JobContext>,
    storage: Arc<RedisStorage<IngestCycleJob>>,
}

impl IngestRuntime {
    pub fn new(job_context: Arc<JobContext>, storage: Arc<RedisStorage<IngestCycleJob>>) -> Self {
        Self {
            job_context,
            storage,
        }
    }

    /// Start the worker and return its handle for shutdown
    pub async fn start_worker(
        &self,
    ) -> Result<tokio::task::JoinHandle<()>, Box<dyn std::error::Error + Send + Sync>> {
        let storage = (*self.storage).clone();
        let job_context = self.job_context.clone();

        let handle = tokio::spawn(async move {
            let worker = WorkerBuilder::new(WORKER_NAME)
                .data(job_context)
                .backend(storage)
                .build_fn(handlers::handle_ingest_cycle);

            info!("IngestRuntime: IngestCycleJob worker started");
            worker.run().await;
        });

        Ok(handle)
    }
}
