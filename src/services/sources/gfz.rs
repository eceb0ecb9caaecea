//! GFZ Potsdam Hp30, a half-hourly planetary index on the Kp scale.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{finite_number, parse_utc};
use crate::error::{IngestError, IngestResult};
use crate::models::RawSample;
use crate::services::fetch::JsonFetcher;

/// Window requested on every fetch.
pub const LOOKBACK_HOURS: i64 = 6;

/// The GFZ API rejects timestamps carrying milliseconds.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn request_url(base: &str, now: DateTime<Utc>) -> IngestResult<Url> {
    let start = now - chrono::Duration::hours(LOOKBACK_HOURS);
    let mut url = Url::parse(base)
        .and_then(|b| b.join("/app/json/"))
        .map_err(|e| IngestError::Config(format!("invalid GFZ base URL '{}': {}", base, e)))?;
    url.query_pairs_mut()
        .append_pair("start", &format_timestamp(start))
        .append_pair("end", &format_timestamp(now))
        .append_pair("index", "Hp30");
    Ok(url)
}

/// Payload is `{ "datetime": [...], "Hp30": [...] }` as parallel arrays.
pub fn parse(payload: &Value) -> IngestResult<Vec<RawSample>> {
    let times = payload
        .get("datetime")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::parse_error("GFZ payload missing 'datetime' array"))?;
    let values = payload
        .get("Hp30")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::parse_error("GFZ payload missing 'Hp30' array"))?;

    let mut samples: Vec<RawSample> = times
        .iter()
        .zip(values)
        .filter_map(|(ts, value)| {
            let timestamp = parse_utc(ts.as_str()?)?;
            Some(RawSample::new(timestamp, finite_number(value)?))
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

pub async fn fetch(
    fetcher: &JsonFetcher,
    base: &str,
    now: DateTime<Utc>,
    timeout: Duration,
) -> IngestResult<Vec<RawSample>> {
    let url = request_url(base, now)?;
    let payload: Value = fetcher.get_json(url.as_str(), timeout).await?;
    parse(&payload)
}
