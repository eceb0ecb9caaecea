//! Health and metrics endpoints

use axum_test::TestServer;
use chrono::Utc;
use kpwatch::core::http::{create_router, AppState, SERVICE_NAME};
use kpwatch::db::MemoryStore;
use kpwatch::jobs::IngestCycle;
use kpwatch::metrics::Metrics;
use kpwatch::overrides::MemoryOverrideStore;
use kpwatch::resolution::FallbackSelector;
use kpwatch::services::{ConditionsClient, JsonFetcher, SourceRegistry};
use serde_json::Value;
use std::sync::Arc;
use wiremock::MockServer;

use crate::support::*;

fn server_for(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).expect("start test server")
}

fn metrics() -> Arc<Metrics> {
    Arc::new(Metrics::new().expect("metrics initialization"))
}

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let server = server_for(AppState::new(metrics(), None));

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], SERVICE_NAME);
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert!(body["last_cycle"].is_null());
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let server = server_for(AppState::new(metrics(), None));

    server.get("/health").await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds"));
    assert!(body.contains("ingest_cycles_total"));
}

#[tokio::test]
async fn health_reports_degraded_after_exhausted_cycle() {
    let providers = MockServer::start().await;
    let now = Utc::now();
    mount_conditions(&providers, now).await;
    mount_empty_forecast(&providers).await;

    let mut config = config_for(&providers);
    config.bom_api_key = None;
    let fetcher = JsonFetcher::new();
    let cycle = Arc::new(IngestCycle::new(
        FallbackSelector::new(SourceRegistry::live(&config, fetcher.clone())),
        ConditionsClient::new(fetcher, config.endpoints.noaa_base.clone()),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryOverrideStore::default()),
        config.kp_retention_hours,
    ));
    cycle.run_at(now).await.expect("cycle should run");

    let server = server_for(AppState::new(metrics(), Some(cycle)));
    let body: Value = server.get("/health").await.json();

    assert_eq!(body["status"], "degraded");
    assert!(body["last_cycle"]["kp"]["selected"].is_null());
    assert_eq!(body["last_cycle"]["scales"]["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = server_for(AppState::new(metrics(), None));
    let response = server.get("/summary").expect_failure().await;
    assert_eq!(response.status_code(), 404);
}
