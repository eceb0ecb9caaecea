//! NOAA SWPC planetary estimated Kp, 1-minute cadence.

use serde_json::Value;
use std::time::Duration;

use super::{finite_number, join_url, parse_utc};
use crate::error::{IngestError, IngestResult};
use crate::models::RawSample;
use crate::services::fetch::JsonFetcher;

pub const PATH: &str = "/json/planetary_k_index_1m.json";

/// Rows are objects carrying `time_tag` and `estimated_kp`, the latter either
/// a number or a numeric string.
pub fn parse(payload: &Value) -> IngestResult<Vec<RawSample>> {
    let rows = payload
        .as_array()
        .ok_or_else(|| IngestError::parse_error("planetary 1m payload is not an array"))?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let timestamp = parse_utc(row.get("time_tag")?.as_str()?)?;
            let value = finite_number(row.get("estimated_kp")?)?;
            Some(RawSample::new(timestamp, value))
        })
        .collect())
}

pub async fn fetch(fetcher: &JsonFetcher, base: &str, timeout: Duration) -> IngestResult<Vec<RawSample>> {
    let payload: Value = fetcher.get_json(&join_url(base, PATH), timeout).await?;
    parse(&payload)
}
