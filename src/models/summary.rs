use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conditions::{ForecastEntry, HistoryPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpStatus {
    Quiet,
    Unsettled,
    Active,
    Storm,
    SevereStorm,
}

impl KpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpStatus::Quiet => "quiet",
            KpStatus::Unsettled => "unsettled",
            KpStatus::Active => "active",
            KpStatus::Storm => "storm",
            KpStatus::SevereStorm => "severe_storm",
        }
    }
}

/// Read model describing current geomagnetic conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub current_value: f64,
    /// `None` only for the "No Data" summary.
    pub current_time: Option<DateTime<Utc>>,
    pub trend: Trend,
    pub status: KpStatus,
    pub status_label: String,
    pub message: String,
    pub recent_history: Vec<HistoryPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastEntry>,
    pub source_label: String,
}

impl Summary {
    pub fn has_data(&self) -> bool {
        self.current_time.is_some()
    }
}
