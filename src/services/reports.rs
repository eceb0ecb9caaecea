//! Read-side helpers over committed state.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::db::SpaceWeatherStore;
use crate::error::IngestResult;
use crate::models::{KpObservation, RiskAssessment, Summary};
use crate::risk::{assess_risk, RiskInputs, TimedValue};
use crate::summary::build_summary;

/// How far back the summary and risk reads look for resolved buckets.
pub const RECENT_WINDOW_HOURS: i64 = 24;

/// Scale readings older than this no longer count toward risk.
pub const SCALE_MAX_AGE_HOURS: i64 = 6;

/// One bucket per timestamp. Different cycles may have committed the same
/// bucket from different sources; the higher-priority source wins.
pub fn collapse_by_priority(rows: Vec<KpObservation>) -> Vec<KpObservation> {
    let mut by_time: BTreeMap<DateTime<Utc>, KpObservation> = BTreeMap::new();
    for row in rows {
        by_time
            .entry(row.timestamp)
            .and_modify(|kept| {
                if row.source.descriptor().priority_rank < kept.source.descriptor().priority_rank {
                    *kept = row;
                }
            })
            .or_insert(row);
    }
    by_time.into_values().collect()
}

/// Resolved buckets from the source the latest cycle committed.
///
/// Rows left behind by a source that has since lost selection are ignored.
/// Without a recorded selection every source is read and collapsed by priority.
pub async fn resolved_kp(store: &dyn SpaceWeatherStore, since: DateTime<Utc>) -> IngestResult<Vec<KpObservation>> {
    match store.latest_selection().await? {
        Some(selection) => store.query_kp(since, Some(selection.source)).await,
        None => Ok(collapse_by_priority(store.query_kp(since, None).await?)),
    }
}

pub async fn current_summary(store: &dyn SpaceWeatherStore, now: DateTime<Utc>) -> IngestResult<Summary> {
    let since = now - Duration::hours(RECENT_WINDOW_HOURS);
    let recent = resolved_kp(store, since).await?;
    let history = store.query_history(since).await?;
    let forecast = store.forecast_at(now).await?;

    Ok(build_summary(&recent, &history, forecast.as_ref()))
}

pub async fn current_risk(store: &dyn SpaceWeatherStore, now: DateTime<Utc>) -> IngestResult<RiskAssessment> {
    let since = now - Duration::hours(RECENT_WINDOW_HOURS);
    let index = resolved_kp(store, since)
        .await?
        .last()
        .map(|o| TimedValue::new(o.value, o.timestamp));

    let wind = store.latest_solar_wind().await?;
    let field_bz = wind.and_then(|w| w.bz.map(|bz| TimedValue::new(bz, w.timestamp)));
    let speed = wind.and_then(|w| w.speed.map(|v| TimedValue::new(v, w.timestamp)));

    let radio_scale = store
        .latest_scales()
        .await?
        .filter(|s| now - s.timestamp <= Duration::hours(SCALE_MAX_AGE_HOURS))
        .map(|s| TimedValue::new(s.radio_blackout as f64, s.timestamp));

    let inputs = RiskInputs {
        index,
        field_bz,
        speed,
        radio_scale,
    };
    Ok(assess_risk(&inputs, now))
}
