//! Auxiliary space-weather readings that feed the risk engine and summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 5-minute downsampled solar wind plasma and magnetometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarWindSample {
    pub timestamp: DateTime<Utc>,
    pub speed: Option<f64>,
    pub density: Option<f64>,
    pub temperature: Option<f64>,
    pub bt: Option<f64>,
    pub bz: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    Observed,
    Estimated,
    Predicted,
}

impl ForecastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastKind::Observed => "observed",
            ForecastKind::Estimated => "estimated",
            ForecastKind::Predicted => "predicted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "observed" => Some(ForecastKind::Observed),
            "estimated" => Some(ForecastKind::Estimated),
            "predicted" => Some(ForecastKind::Predicted),
            _ => None,
        }
    }
}

/// One 3-hour window of the planetary Kp forecast product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub kind: ForecastKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noaa_scale: Option<String>,
}

/// Current NOAA R/S/G scale levels (0-5 each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleReading {
    pub timestamp: DateTime<Utc>,
    pub radio_blackout: u8,
    pub solar_radiation: u8,
    pub geomagnetic_storm: u8,
}

/// Three-hourly planetary Kp observation kept as longer-range context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
