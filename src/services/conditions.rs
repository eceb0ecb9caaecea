//! NOAA auxiliary feeds: planetary Kp history, forecast, solar wind and scales.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{IngestError, IngestResult};
use crate::models::{ForecastEntry, HistoryPoint, ScaleReading, SolarWindSample};
use crate::resolution::bucket::bucket_start;
use crate::services::fetch::JsonFetcher;
use crate::services::sources::{finite_number, forecast, join_url, parse_utc};

pub const HISTORY_PATH: &str = "/products/noaa-planetary-k-index.json";
pub const PLASMA_PATH: &str = "/products/solar-wind/plasma-7-day.json";
pub const MAG_PATH: &str = "/products/solar-wind/mag-7-day.json";
pub const SCALES_PATH: &str = "/products/noaa-scales.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const SOLAR_WIND_BUCKET: Duration = Duration::from_secs(5 * 60);
const SOLAR_WIND_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasmaReading {
    pub timestamp: DateTime<Utc>,
    pub density: Option<f64>,
    pub speed: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagReading {
    pub timestamp: DateTime<Utc>,
    pub bz: Option<f64>,
    pub bt: Option<f64>,
}

fn table_rows<'a>(payload: &'a Value, what: &str) -> IngestResult<&'a [Value]> {
    payload
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| IngestError::parse_error(format!("{} payload is not an array", what)))
}

/// Row timestamp from column 0; `None` for the header row.
fn row_time(row: &[Value]) -> Option<DateTime<Utc>> {
    parse_utc(row.first()?.as_str()?)
}

fn cell(row: &[Value], idx: usize) -> Option<f64> {
    row.get(idx).and_then(finite_number)
}

/// Rows `[time_tag, Kp, a_running, station_count]`.
pub fn parse_history(payload: &Value) -> IngestResult<Vec<HistoryPoint>> {
    let mut points: Vec<HistoryPoint> = table_rows(payload, "planetary Kp")?
        .iter()
        .filter_map(Value::as_array)
        .filter_map(|row| {
            Some(HistoryPoint {
                timestamp: row_time(row)?,
                value: cell(row, 1)?,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

/// Rows `[time_tag, density, speed, temperature]`.
pub fn parse_plasma(payload: &Value) -> IngestResult<Vec<PlasmaReading>> {
    Ok(table_rows(payload, "plasma")?
        .iter()
        .filter_map(Value::as_array)
        .filter_map(|row| {
            Some(PlasmaReading {
                timestamp: row_time(row)?,
                density: cell(row, 1),
                speed: cell(row, 2),
                temperature: cell(row, 3),
            })
        })
        .collect())
}

/// Rows `[time_tag, bx_gsm, by_gsm, bz_gsm, lon_gsm, lat_gsm, bt]`.
pub fn parse_mag(payload: &Value) -> IngestResult<Vec<MagReading>> {
    Ok(table_rows(payload, "mag")?
        .iter()
        .filter_map(Value::as_array)
        .filter_map(|row| {
            Some(MagReading {
                timestamp: row_time(row)?,
                bz: cell(row, 3),
                bt: cell(row, 6),
            })
        })
        .collect())
}

#[derive(Default)]
struct WindAccumulator {
    speed: Mean,
    density: Mean,
    temperature: Mean,
    bt: Mean,
    bz: Mean,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Merge plasma and magnetometer readings into 5-minute means, ignoring nulls.
pub fn downsample_solar_wind(plasma: &[PlasmaReading], mag: &[MagReading]) -> Vec<SolarWindSample> {
    let mut buckets: BTreeMap<DateTime<Utc>, WindAccumulator> = BTreeMap::new();

    for p in plasma {
        let acc = buckets.entry(bucket_start(p.timestamp, SOLAR_WIND_BUCKET)).or_default();
        acc.speed.push(p.speed);
        acc.density.push(p.density);
        acc.temperature.push(p.temperature);
    }
    for m in mag {
        let acc = buckets.entry(bucket_start(m.timestamp, SOLAR_WIND_BUCKET)).or_default();
        acc.bt.push(m.bt);
        acc.bz.push(m.bz);
    }

    buckets
        .into_iter()
        .map(|(timestamp, acc)| SolarWindSample {
            timestamp,
            speed: acc.speed.value(),
            density: acc.density.value(),
            temperature: acc.temperature.value(),
            bt: acc.bt.value(),
            bz: acc.bz.value(),
        })
        .collect()
}

/// Key `"0"` holds the current period; each of `R`, `S`, `G` carries a
/// `Scale` string. Missing or unparsable levels read as 0.
pub fn parse_scales(payload: &Value, now: DateTime<Utc>) -> IngestResult<ScaleReading> {
    let current = payload
        .as_object()
        .ok_or_else(|| IngestError::parse_error("scales payload is not an object"))?
        .get("0");

    let level = |key: &str| -> u8 {
        current
            .and_then(|c| c.get(key))
            .and_then(|s| s.get("Scale"))
            .and_then(finite_number)
            .map(|v| v.clamp(0.0, 5.0) as u8)
            .unwrap_or(0)
    };

    let timestamp = current
        .and_then(|c| {
            let date = c.get("DateStamp")?.as_str()?;
            let time = c.get("TimeStamp")?.as_str()?;
            parse_utc(&format!("{} {}", date, time))
        })
        .unwrap_or(now);

    Ok(ScaleReading {
        timestamp,
        radio_blackout: level("R"),
        solar_radiation: level("S"),
        geomagnetic_storm: level("G"),
    })
}

/// Client for the NOAA feeds that sit beside Kp resolution.
#[derive(Clone)]
pub struct ConditionsClient {
    fetcher: JsonFetcher,
    noaa_base: String,
}

impl ConditionsClient {
    pub fn new(fetcher: JsonFetcher, noaa_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            noaa_base: noaa_base.into(),
        }
    }

    async fn get(&self, path: &str) -> IngestResult<Value> {
        self.fetcher.get_json(&join_url(&self.noaa_base, path), FETCH_TIMEOUT).await
    }

    pub async fn history(&self) -> IngestResult<Vec<HistoryPoint>> {
        parse_history(&self.get(HISTORY_PATH).await?)
    }

    pub async fn forecast(&self) -> IngestResult<Vec<ForecastEntry>> {
        forecast::fetch(&self.fetcher, &self.noaa_base, FETCH_TIMEOUT).await
    }

    /// Last 24 hours of plasma and magnetometer data, 5-minute downsampled.
    pub async fn solar_wind(&self, now: DateTime<Utc>) -> IngestResult<Vec<SolarWindSample>> {
        let (plasma, mag) = tokio::try_join!(self.get(PLASMA_PATH), self.get(MAG_PATH))?;
        let cutoff = now - chrono::Duration::hours(SOLAR_WIND_WINDOW_HOURS);

        let plasma: Vec<PlasmaReading> = parse_plasma(&plasma)?
            .into_iter()
            .filter(|p| p.timestamp > cutoff)
            .collect();
        let mag: Vec<MagReading> = parse_mag(&mag)?
            .into_iter()
            .filter(|m| m.timestamp > cutoff)
            .collect();

        Ok(downsample_solar_wind(&plasma, &mag))
    }

    pub async fn scales(&self, now: DateTime<Utc>) -> IngestResult<ScaleReading> {
        parse_scales(&self.get(SCALES_PATH).await?, now)
    }
}
