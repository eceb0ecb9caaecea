//! Summary and risk read paths over committed state

use chrono::{DateTime, Duration, Utc};
use kpwatch::db::{MemoryStore, SpaceWeatherStore};
use kpwatch::models::{
    ForecastEntry, ForecastKind, HistoryPoint, KpObservation, KpSelection, KpStatus, RiskLevel, ScaleReading,
    SolarWindSample, SourceId, Trend,
};
use kpwatch::services::{current_risk, current_summary};

fn kp(now: DateTime<Utc>, minutes_ago: i64, value: f64, source: SourceId) -> KpObservation {
    KpObservation {
        timestamp: now - Duration::minutes(minutes_ago),
        value,
        sample_count: 15,
        source,
    }
}

async fn seeded_store(now: DateTime<Utc>) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .upsert_kp(&[
            kp(now, 45, 4.0, SourceId::NoaaEstimated),
            kp(now, 30, 5.0, SourceId::NoaaEstimated),
            kp(now, 15, 6.2, SourceId::NoaaEstimated),
            kp(now, 15, 1.0, SourceId::Gfz),
        ])
        .await
        .unwrap();
    store
        .upsert_history(&[HistoryPoint {
            timestamp: now - Duration::hours(3),
            value: 4.33,
        }])
        .await
        .unwrap();
    store
        .upsert_forecast(&[ForecastEntry {
            timestamp: now - Duration::hours(1),
            value: 5.67,
            kind: ForecastKind::Estimated,
            noaa_scale: Some("G2".to_string()),
        }])
        .await
        .unwrap();
    store
        .upsert_solar_wind(&[SolarWindSample {
            timestamp: now - Duration::minutes(5),
            speed: Some(650.0),
            density: Some(4.0),
            temperature: None,
            bt: Some(14.0),
            bz: Some(-12.0),
        }])
        .await
        .unwrap();
    store
        .record_scales(&ScaleReading {
            timestamp: now - Duration::hours(1),
            radio_blackout: 2,
            solar_radiation: 0,
            geomagnetic_storm: 2,
        })
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn summary_prefers_higher_priority_bucket() {
    let now = Utc::now();
    let store = seeded_store(now).await;

    let summary = current_summary(&store, now).await.unwrap();

    assert_eq!(summary.current_value, 6.2);
    assert_eq!(summary.status, KpStatus::Storm);
    assert_eq!(summary.trend, Trend::Rising);
    assert_eq!(summary.source_label, "NOAA Estimated Kp");
    assert_eq!(summary.recent_history.len(), 1);
    assert_eq!(summary.forecast.map(|f| f.value), Some(5.67));
}

#[tokio::test]
async fn risk_uses_latest_committed_inputs() {
    let now = Utc::now();
    let store = seeded_store(now).await;

    let assessment = current_risk(&store, now).await.unwrap();

    assert_eq!(assessment.score, 69);
    assert_eq!(assessment.level, RiskLevel::Severe);
    assert_eq!(assessment.updated_at, now - Duration::minutes(5));
}

#[tokio::test]
async fn old_scale_reading_is_ignored() {
    let now = Utc::now();
    let store = seeded_store(now).await;
    store
        .record_scales(&ScaleReading {
            timestamp: now - Duration::hours(30),
            radio_blackout: 5,
            solar_radiation: 0,
            geomagnetic_storm: 0,
        })
        .await
        .unwrap();

    // The newer R2 reading still wins; an old reading alone would not count.
    let assessment = current_risk(&store, now).await.unwrap();
    assert_eq!(assessment.factors[3].score, 35);

    let stale_only = MemoryStore::new();
    stale_only
        .record_scales(&ScaleReading {
            timestamp: now - Duration::hours(7),
            radio_blackout: 5,
            solar_radiation: 0,
            geomagnetic_storm: 0,
        })
        .await
        .unwrap();
    let assessment = current_risk(&stale_only, now).await.unwrap();
    assert_eq!(assessment.factors[3].score, 0);
    assert_eq!(assessment.factors[3].detail, "no data");
}

#[tokio::test]
async fn reads_follow_the_source_the_last_cycle_selected() {
    let now = Utc::now();
    let store = MemoryStore::new();

    // An earlier cycle committed the estimated feed.
    store
        .upsert_kp(&[
            kp(now, 50, 2.0, SourceId::NoaaEstimated),
            kp(now, 35, 2.0, SourceId::NoaaEstimated),
        ])
        .await
        .unwrap();
    store
        .record_selection(&KpSelection {
            source: SourceId::NoaaEstimated,
            resolved_at: now - Duration::minutes(30),
        })
        .await
        .unwrap();

    // The estimated feed went stale and the forecast won this cycle.
    store
        .upsert_kp(&[kp(now, 80, 6.33, SourceId::NoaaForecast)])
        .await
        .unwrap();
    store
        .record_selection(&KpSelection {
            source: SourceId::NoaaForecast,
            resolved_at: now,
        })
        .await
        .unwrap();

    let summary = current_summary(&store, now).await.unwrap();
    assert_eq!(summary.current_value, 6.33);
    assert_eq!(summary.source_label, SourceId::NoaaForecast.descriptor().label);

    let assessment = current_risk(&store, now).await.unwrap();
    assert_eq!(assessment.factors[0].raw_value, Some(6.33));
}

#[tokio::test]
async fn empty_store_reports_no_data() {
    let now = Utc::now();
    let store = MemoryStore::new();

    let summary = current_summary(&store, now).await.unwrap();
    let assessment = current_risk(&store, now).await.unwrap();

    assert_eq!(summary.status_label, "No Data");
    assert_eq!(assessment.score, 0);
    assert_eq!(assessment.level, RiskLevel::Low);
    assert_eq!(assessment.updated_at, now);
}
