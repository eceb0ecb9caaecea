//! Unit tests for the conditions summary

use chrono::{DateTime, Duration, TimeZone, Utc};
use kpwatch::models::{ForecastEntry, ForecastKind, HistoryPoint, KpObservation, KpStatus, SourceId, Trend};
use kpwatch::summary::{build_summary, classify, message, status_label, trend, NO_DATA_MESSAGE, RECENT_HISTORY_LEN};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

fn observations(values: &[f64], source: SourceId) -> Vec<KpObservation> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| KpObservation {
            timestamp: t0() + Duration::minutes(15 * i as i64),
            value: *v,
            sample_count: 15,
            source,
        })
        .collect()
}

#[test]
fn status_boundaries() {
    assert_eq!(classify(2.999), KpStatus::Quiet);
    assert_eq!(classify(3.0), KpStatus::Unsettled);
    assert_eq!(classify(4.0), KpStatus::Active);
    assert_eq!(classify(5.0), KpStatus::Storm);
    assert_eq!(classify(6.999), KpStatus::Storm);
    assert_eq!(classify(7.0), KpStatus::SevereStorm);
    assert_eq!(classify(9.0), KpStatus::SevereStorm);
}

#[test]
fn trend_uses_last_two_values() {
    assert_eq!(trend(&[]), Trend::Stable);
    assert_eq!(trend(&[4.0]), Trend::Stable);
    assert_eq!(trend(&[1.0, 2.0, 2.6]), Trend::Rising);
    assert_eq!(trend(&[2.0, 2.5]), Trend::Stable);
    assert_eq!(trend(&[3.0, 2.4]), Trend::Falling);
    assert_eq!(trend(&[3.0, 2.5]), Trend::Stable);
}

#[test]
fn labels_and_messages_are_templated() {
    assert_eq!(status_label(KpStatus::Storm), "Geomagnetic Storm");
    assert_eq!(
        message(3.3, Trend::Rising, KpStatus::Unsettled),
        "Conditions are unsettled (Kp 3.3 and rising). Minor fluctuations possible."
    );
    assert_eq!(
        message(1.0, Trend::Falling, KpStatus::Quiet),
        "Geomagnetic conditions are quiet (Kp 1.0). No significant impacts expected."
    );
}

#[test]
fn no_resolved_points_yields_no_data_summary() {
    let summary = build_summary(&[], &[], None);

    assert!(!summary.has_data());
    assert_eq!(summary.status_label, "No Data");
    assert_eq!(summary.message, NO_DATA_MESSAGE);
    assert_eq!(summary.current_value, 0.0);
    assert_eq!(summary.trend, Trend::Stable);
}

#[test]
fn summary_reflects_latest_bucket() {
    let recent = observations(&[3.0, 3.7, 5.3], SourceId::NoaaBoulder);
    let forecast = ForecastEntry {
        timestamp: t0(),
        value: 5.67,
        kind: ForecastKind::Predicted,
        noaa_scale: Some("G1".to_string()),
    };

    let summary = build_summary(&recent, &[], Some(&forecast));

    assert_eq!(summary.current_value, 5.3);
    assert_eq!(summary.current_time, Some(t0() + Duration::minutes(30)));
    assert_eq!(summary.trend, Trend::Rising);
    assert_eq!(summary.status, KpStatus::Storm);
    assert_eq!(summary.source_label, "NOAA Boulder K-index");
    assert_eq!(summary.forecast, Some(forecast));
    assert!(summary.message.contains("Kp 5.3 and rising"));
}

#[test]
fn summary_keeps_most_recent_history() {
    let history: Vec<HistoryPoint> = (0..12)
        .map(|i| HistoryPoint {
            timestamp: t0() + Duration::hours(3 * i),
            value: i as f64 * 0.5,
        })
        .collect();

    let summary = build_summary(&observations(&[2.0], SourceId::NoaaEstimated), &history, None);

    assert_eq!(summary.recent_history.len(), RECENT_HISTORY_LEN);
    assert_eq!(summary.recent_history.last(), history.last());
    assert_eq!(summary.recent_history[0], history[4]);
}
