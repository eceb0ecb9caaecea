//! Unit tests for freshness and anomaly validation

use chrono::{DateTime, Duration, TimeZone, Utc};
use kpwatch::models::{NormalizedPoint, SourceId};
use kpwatch::resolution::{validate, Rejection, ValidationPolicy};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

/// 15-minute buckets ending `latest_age_minutes` before now.
fn series(values: &[f64], latest_age_minutes: i64) -> Vec<NormalizedPoint> {
    let latest = now() - Duration::minutes(latest_age_minutes);
    let n = values.len() as i64;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| NormalizedPoint::new(latest - Duration::minutes(15 * (n - 1 - i as i64)), *v, 15))
        .collect()
}

fn check(source: SourceId, points: &[NormalizedPoint]) -> Result<(), Rejection> {
    validate(&source.descriptor(), points, now(), &ValidationPolicy::default())
}

#[test]
fn empty_series_is_rejected() {
    assert_eq!(check(SourceId::NoaaEstimated, &[]), Err(Rejection::Empty));
    assert_eq!(check(SourceId::NoaaForecast, &[]), Err(Rejection::Empty));
}

#[test]
fn freshness_boundary() {
    assert!(check(SourceId::NoaaEstimated, &series(&[2.0, 2.3], 29)).is_ok());
    assert_eq!(
        check(SourceId::NoaaEstimated, &series(&[2.0, 2.3], 30)),
        Err(Rejection::Stale { age_minutes: 30 })
    );
    assert_eq!(
        check(SourceId::NoaaEstimated, &series(&[2.0, 2.3], 31)),
        Err(Rejection::Stale { age_minutes: 31 })
    );
}

#[test]
fn half_hourly_source_is_age_checked() {
    let result = check(SourceId::Gfz, &series(&[3.0], 90));
    assert!(matches!(result, Err(Rejection::Stale { .. })));
}

#[test]
fn low_resolution_sources_are_exempt_from_age_check() {
    assert!(check(SourceId::NoaaForecast, &series(&[3.0, 3.3], 240)).is_ok());
    assert!(check(SourceId::Bom, &series(&[2.0], 600)).is_ok());
}

#[test]
fn isolated_zero_after_activity_is_rejected() {
    let result = check(SourceId::NoaaEstimated, &series(&[1.0, 2.3, 1.7, 0.0], 5));
    assert_eq!(result, Err(Rejection::AnomalousZero { preceding: 1.7 }));
}

#[test]
fn zero_after_quiet_buckets_is_accepted() {
    assert!(check(SourceId::NoaaEstimated, &series(&[0.7, 0.3, 0.2, 0.0], 5)).is_ok());
}

#[test]
fn anomaly_lookback_is_three_buckets() {
    // The 5.0 sits four buckets back and is outside the window.
    assert!(check(SourceId::NoaaEstimated, &series(&[5.0, 0.2, 0.3, 0.1, 0.0], 5)).is_ok());
    assert!(check(SourceId::NoaaEstimated, &series(&[5.0, 0.3, 0.1, 0.0], 5)).is_err());
}

#[test]
fn single_zero_bucket_is_accepted() {
    assert!(check(SourceId::NoaaEstimated, &series(&[0.0], 5)).is_ok());
}

#[test]
fn anomaly_check_applies_to_exempt_sources() {
    let result = check(SourceId::NoaaForecast, &series(&[4.0, 0.0], 0));
    assert!(matches!(result, Err(Rejection::AnomalousZero { .. })));
}

#[test]
fn policy_thresholds_are_tunable() {
    let policy = ValidationPolicy {
        max_age: Duration::minutes(60),
        anomaly_lookback: 1,
        anomaly_threshold: 2.0,
    };
    let desc = SourceId::NoaaEstimated.descriptor();

    assert!(validate(&desc, &series(&[2.0], 45), now(), &policy).is_ok());
    assert!(validate(&desc, &series(&[3.0, 1.5, 0.0], 5), now(), &policy).is_ok());
    assert!(validate(&desc, &series(&[1.5, 2.5, 0.0], 5), now(), &policy).is_err());
}

#[test]
fn rejection_kinds_are_stable_labels() {
    assert_eq!(Rejection::Empty.kind(), "empty");
    assert_eq!(Rejection::Stale { age_minutes: 40 }.kind(), "stale");
    assert_eq!(Rejection::AnomalousZero { preceding: 2.0 }.kind(), "anomalous_zero");
}
