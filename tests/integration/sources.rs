//! Kp adapters against a mocked provider

use chrono::Utc;
use kpwatch::error::IngestError;
use kpwatch::models::{SourceId, SourceOverride};
use kpwatch::resolution::FallbackSelector;
use kpwatch::services::sources::{bom, noaa_estimated};
use kpwatch::services::{JsonFetcher, KpSourceAdapter, ProviderAdapter, SourceRegistry};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::*;

fn adapter(server: &MockServer, source: SourceId, bom_api_key: Option<&str>) -> ProviderAdapter {
    let config = config_for(server);
    ProviderAdapter::new(
        source,
        JsonFetcher::new(),
        config.endpoints,
        bom_api_key.map(str::to_string),
    )
}

#[tokio::test]
async fn estimated_adapter_bucketizes_minute_samples() {
    let server = MockServer::start().await;
    let now = Utc::now();
    mount_json(&server, "GET", noaa_estimated::PATH, estimated_payload(now, &[1.0, 2.0, 3.0, 4.0], 2)).await;

    let points = adapter(&server, SourceId::NoaaEstimated, None)
        .fetch_buckets()
        .await
        .unwrap();

    assert_eq!(points.len(), 4);
    assert!(points.iter().all(|p| p.sample_count == 1));
    assert_eq!(points.last().map(|p| p.value), Some(4.0));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    mount_status(&server, "GET", noaa_estimated::PATH, 503).await;

    let err = adapter(&server, SourceId::NoaaEstimated, None)
        .fetch_buckets()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Status { status_code: 503, .. }));
    assert_eq!(err.kind(), "status");
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(noaa_estimated::PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = adapter(&server, SourceId::NoaaEstimated, None)
        .fetch_buckets()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "parse");
}

#[tokio::test]
async fn gfz_requests_hp30_window() {
    let server = MockServer::start().await;
    let now = Utc::now();
    Mock::given(method("GET"))
        .and(path("/app/json/"))
        .and(query_param("index", "Hp30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gfz_payload(now, &[1.667, 2.0])))
        .expect(1)
        .mount(&server)
        .await;

    let points = adapter(&server, SourceId::Gfz, None).fetch_buckets().await.unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[1].value, 2.0);
}

#[tokio::test]
async fn bom_posts_api_key_and_region() {
    let server = MockServer::start().await;
    let now = Utc::now();
    Mock::given(method("POST"))
        .and(path(bom::PATH))
        .and(body_partial_json(json!({
            "api_key": "test-key",
            "options": {"location": bom::LOCATION}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(bom_payload(now)))
        .expect(1)
        .mount(&server)
        .await;

    let points = adapter(&server, SourceId::Bom, Some("test-key"))
        .fetch_buckets()
        .await
        .unwrap();

    assert_eq!(points.len(), 2);
}

#[tokio::test]
async fn bom_without_key_fails_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(bom::PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter(&server, SourceId::Bom, None).fetch_buckets().await.unwrap_err();

    assert_eq!(err.kind(), "config");
}

#[tokio::test]
async fn live_registry_falls_back_past_failed_primary() {
    let server = MockServer::start().await;
    let now = Utc::now();
    mount_all_sources(&server, now).await;
    mount_status(&server, "GET", noaa_estimated::PATH, 500).await;

    let registry = SourceRegistry::live(&config_for(&server), JsonFetcher::new());
    let resolution = FallbackSelector::new(registry).resolve_at(SourceOverride::Auto, now).await;

    assert_eq!(resolution.selected_source(), Some(SourceId::NoaaBoulder));
    assert_eq!(resolution.attempts.len(), 2);
    assert_eq!(resolution.attempts[0].outcome.reason(), Some("status"));
}
