//! NOAA SWPC planetary Kp forecast product.
//!
//! The payload is a table of string rows `[time_tag, kp, observed, noaa_scale]`
//! with a header row first. Each row covers a 3-hour window and is tagged
//! `observed`, `estimated` or `predicted`. Only `estimated` rows feed Kp
//! resolution; all kinds are kept for the forecast table.

use serde_json::Value;
use std::time::Duration;

use super::{finite_number, join_url, parse_utc};
use crate::error::{IngestError, IngestResult};
use crate::models::{ForecastEntry, ForecastKind, RawSample};
use crate::services::fetch::JsonFetcher;

pub const PATH: &str = "/products/noaa-planetary-k-index-forecast.json";

pub fn parse(payload: &Value) -> IngestResult<Vec<ForecastEntry>> {
    let rows = payload
        .as_array()
        .ok_or_else(|| IngestError::parse_error("forecast payload is not an array"))?;

    let mut entries: Vec<ForecastEntry> = rows.iter().filter_map(parse_row).collect();
    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

fn parse_row(row: &Value) -> Option<ForecastEntry> {
    // Older payloads are positional string rows; newer ones are keyed objects.
    let (time_tag, kp, kind, scale) = match row {
        Value::Array(cells) => (cells.first()?, cells.get(1)?, cells.get(2)?, cells.get(3)),
        Value::Object(map) => (
            map.get("time_tag")?,
            map.get("kp")?,
            map.get("observed")?,
            map.get("noaa_scale"),
        ),
        _ => return None,
    };

    // Header row fails here: "kp" is not a number.
    let value = finite_number(kp)?;
    let timestamp = parse_utc(time_tag.as_str()?)?;
    let kind = ForecastKind::parse(kind.as_str()?)?;
    let noaa_scale = scale
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(ForecastEntry {
        timestamp,
        value,
        kind,
        noaa_scale,
    })
}

/// Samples from the `estimated` windows only.
pub fn estimated_samples(entries: &[ForecastEntry]) -> Vec<RawSample> {
    entries
        .iter()
        .filter(|e| e.kind == ForecastKind::Estimated)
        .map(|e| RawSample::new(e.timestamp, e.value))
        .collect()
}

pub async fn fetch(fetcher: &JsonFetcher, base: &str, timeout: Duration) -> IngestResult<Vec<ForecastEntry>> {
    let payload: Value = fetcher.get_json(&join_url(base, PATH), timeout).await?;
    parse(&payload)
}
