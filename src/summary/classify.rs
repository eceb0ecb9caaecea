use crate::models::{KpStatus, Trend};

/// Minimum change between the two latest buckets to count as a trend.
pub const TREND_THRESHOLD: f64 = 0.5;

pub fn classify(value: f64) -> KpStatus {
    if value >= 7.0 {
        KpStatus::SevereStorm
    } else if value >= 5.0 {
        KpStatus::Storm
    } else if value >= 4.0 {
        KpStatus::Active
    } else if value >= 3.0 {
        KpStatus::Unsettled
    } else {
        KpStatus::Quiet
    }
}

/// Trend from the last two values of an ascending series.
pub fn trend(values: &[f64]) -> Trend {
    let [.., previous, latest] = values else {
        return Trend::Stable;
    };
    let diff = latest - previous;
    if diff > TREND_THRESHOLD {
        Trend::Rising
    } else if diff < -TREND_THRESHOLD {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

pub fn status_label(status: KpStatus) -> &'static str {
    match status {
        KpStatus::Quiet => "Quiet",
        KpStatus::Unsettled => "Unsettled",
        KpStatus::Active => "Active",
        KpStatus::Storm => "Geomagnetic Storm",
        KpStatus::SevereStorm => "Severe Storm",
    }
}

pub fn message(value: f64, trend: Trend, status: KpStatus) -> String {
    let trend_text = match trend {
        Trend::Rising => " and rising",
        Trend::Falling => " and falling",
        Trend::Stable => "",
    };

    match status {
        KpStatus::Quiet => format!(
            "Geomagnetic conditions are quiet (Kp {:.1}). No significant impacts expected.",
            value
        ),
        KpStatus::Unsettled => format!(
            "Conditions are unsettled (Kp {:.1}{}). Minor fluctuations possible.",
            value, trend_text
        ),
        KpStatus::Active => format!(
            "Active geomagnetic conditions (Kp {:.1}{}). Possible minor GNSS degradation at high latitudes.",
            value, trend_text
        ),
        KpStatus::Storm => format!(
            "Geomagnetic storm in progress (Kp {:.1}{}). GNSS users should monitor solution quality.",
            value, trend_text
        ),
        KpStatus::SevereStorm => format!(
            "Severe geomagnetic storm (Kp {:.1}{}). Significant GNSS degradation expected. Consider postponing precision work.",
            value, trend_text
        ),
    }
}
