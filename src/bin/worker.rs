//! kpwatch ingestion worker
//!
//! Runs the ingestion cycle on a fixed interval via the Redis job queue and
//! serves /health and /metrics.

use apalis_redis::RedisStorage;
use dotenvy::dotenv;
use kpwatch::config::{get_environment, get_questdb_url, get_redis_url, IngestConfig};
use kpwatch::core::http::{self, AppState};
use kpwatch::core::runtime::IngestRuntime;
use kpwatch::core::scheduler::JobScheduler;
use kpwatch::db::{QuestDatabase, SpaceWeatherStore};
use kpwatch::jobs::context::JobContext;
use kpwatch::jobs::cycle::IngestCycle;
use kpwatch::jobs::types::IngestCycleJob;
use kpwatch::logging;
use kpwatch::metrics::Metrics;
use kpwatch::overrides::{OverrideStore, RedisOverrideStore};
use kpwatch::resolution::FallbackSelector;
use kpwatch::services::{ConditionsClient, JsonFetcher, SourceRegistry};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = IngestConfig::from_env();
    info!("Starting kpwatch worker");
    info!(environment = %get_environment(), "Environment");

    if config.interval_seconds == 0 {
        return Err("INGEST_INTERVAL_SECONDS must be > 0 for worker".into());
    }
    if config.bom_api_key.is_none() {
        warn!("BOM_API_KEY not set, the BoM fallback source will always fail");
    }

    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing QuestDB connection...");
    let database = match QuestDatabase::connect(&get_questdb_url()).await {
        Ok(db) => {
            info!("QuestDB connected");
            metrics.database_connected.set(1.0);
            db
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to QuestDB");
            return Err(format!("QuestDB connection required for worker: {}", e).into());
        }
    };
    let store: Arc<dyn SpaceWeatherStore> = Arc::new(database);

    let redis_url = get_redis_url();
    info!("Initializing Redis connection...");
    let overrides: Arc<dyn OverrideStore> = match RedisOverrideStore::connect(&redis_url).await {
        Ok(o) => {
            info!("Redis connected");
            metrics.cache_connected.set(1.0);
            Arc::new(o)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to Redis");
            return Err(format!("Redis connection required for worker: {}", e).into());
        }
    };

    let fetcher = JsonFetcher::new();
    let registry = SourceRegistry::live(&config, fetcher.clone());
    info!(
        sources = registry.len(),
        interval = config.interval_seconds,
        "Kp sources registered, cycle every {} seconds",
        config.interval_seconds
    );

    let cycle = Arc::new(
        IngestCycle::new(
            FallbackSelector::new(registry),
            ConditionsClient::new(fetcher, config.endpoints.noaa_base.clone()),
            store,
            overrides,
            config.kp_retention_hours,
        )
        .with_metrics(metrics.clone()),
    );

    info!("Initializing Apalis Redis storage...");
    let conn = apalis_redis::connect(redis_url).await?;
    let storage: Arc<RedisStorage<IngestCycleJob>> = Arc::new(RedisStorage::new(conn));
    info!("Apalis Redis storage initialized");

    let job_context = Arc::new(JobContext::new(
        cycle.clone(),
        Some(metrics.clone()),
        config.interval_seconds,
    ));

    info!("Starting Apalis worker...");
    let runtime = IngestRuntime::new(job_context, storage.clone());
    let worker_handle = runtime
        .start_worker()
        .await
        .map_err(|e| format!("Failed to start worker: {}", e))?;

    info!("Starting job scheduler...");
    let scheduler = JobScheduler::new(storage, config.interval_seconds)
        .map_err(|e| format!("Failed to create scheduler: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| format!("Failed to start scheduler: {}", e))?;

    let state = AppState::new(metrics, Some(cycle));
    let port = config.http_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = http::start_server(port, state).await {
            error!(error = %e, "HTTP server exited");
        }
    });

    // Graceful shutdown
    info!("Worker started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down worker...");
            scheduler.stop().await;
            worker_handle.abort();
            server_handle.abort();
            info!("Worker stopped");
        }
    }

    Ok(())
}
