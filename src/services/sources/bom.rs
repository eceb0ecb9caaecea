//! Australian Bureau of Meteorology regional K-index (K-aus).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{finite_number, join_url, parse_utc};
use crate::error::{IngestError, IngestResult};
use crate::models::RawSample;
use crate::services::fetch::JsonFetcher;

pub const PATH: &str = "/api/v1/get-k-index";
pub const LOCATION: &str = "Australian region";
pub const LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Serialize)]
pub struct KIndexRequest<'a> {
    pub api_key: &'a str,
    pub options: KIndexOptions,
}

#[derive(Debug, Serialize)]
pub struct KIndexOptions {
    pub location: &'static str,
    pub start: String,
    pub end: String,
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn request_body(api_key: &str, now: DateTime<Utc>) -> KIndexRequest<'_> {
    KIndexRequest {
        api_key,
        options: KIndexOptions {
            location: LOCATION,
            start: format_timestamp(now - chrono::Duration::hours(LOOKBACK_HOURS)),
            end: format_timestamp(now),
        },
    }
}

/// Payload is `{ "data": [ {index, valid_time}, ... ] }`; the array is
/// sometimes wrapped one level deeper as `[[...]]`.
pub fn parse(payload: &Value) -> IngestResult<Vec<RawSample>> {
    let data = payload
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::parse_error("BoM payload missing 'data' array"))?;

    let entries: Vec<&Value> = match data.first() {
        Some(Value::Array(_)) => data
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .collect(),
        _ => data.iter().collect(),
    };

    let mut samples: Vec<RawSample> = entries
        .into_iter()
        .filter_map(|entry| {
            let timestamp = parse_utc(entry.get("valid_time")?.as_str()?)?;
            let value = finite_number(entry.get("index")?)?;
            Some(RawSample::new(timestamp, value))
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

pub async fn fetch(
    fetcher: &JsonFetcher,
    base: &str,
    api_key: Option<&str>,
    now: DateTime<Utc>,
    timeout: Duration,
) -> IngestResult<Vec<RawSample>> {
    let api_key = api_key.ok_or_else(|| IngestError::Config("BOM_API_KEY is not set".to_string()))?;
    let payload: Value = fetcher
        .post_json(&join_url(base, PATH), &request_body(api_key, now), timeout)
        .await?;
    parse(&payload)
}
