use crate::models::{ForecastEntry, HistoryPoint, KpObservation, KpStatus, Summary, Trend};

use super::classify::{classify, message, status_label, trend};

pub const NO_DATA_MESSAGE: &str = "No Kp data available. Data may still be loading.";

/// Number of planetary history points carried on a summary (~24h of 3-hour windows).
pub const RECENT_HISTORY_LEN: usize = 8;

pub fn no_data_summary() -> Summary {
    Summary {
        current_value: 0.0,
        current_time: None,
        trend: Trend::Stable,
        status: KpStatus::Quiet,
        status_label: "No Data".to_string(),
        message: NO_DATA_MESSAGE.to_string(),
        recent_history: Vec::new(),
        forecast: None,
        source_label: String::new(),
    }
}

/// Build the summary bundle.
///
/// `recent` is ascending with the current bucket last; `history` is the
/// ascending planetary series of which the newest entries are kept.
pub fn build_summary(
    recent: &[KpObservation],
    history: &[HistoryPoint],
    forecast: Option<&ForecastEntry>,
) -> Summary {
    let Some(current) = recent.last() else {
        return no_data_summary();
    };

    let values: Vec<f64> = recent.iter().map(|o| o.value).collect();
    let trend = trend(&values);
    let status = classify(current.value);
    let skip = history.len().saturating_sub(RECENT_HISTORY_LEN);

    Summary {
        current_value: current.value,
        current_time: Some(current.timestamp),
        trend,
        status,
        status_label: status_label(status).to_string(),
        message: message(current.value, trend, status),
        recent_history: history[skip..].to_vec(),
        forecast: forecast.cloned(),
        source_label: current.source.descriptor().label.to_string(),
    }
}
