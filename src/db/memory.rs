use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{forecast_window, SpaceWeatherStore};
use crate::error::IngestResult;
use crate::models::{
    ForecastEntry, HistoryPoint, KpObservation, KpSelection, ScaleReading, SolarWindSample, SourceId,
};

/// In-process store with the same upsert semantics as QuestDB's dedup keys.
#[derive(Default)]
pub struct MemoryStore {
    kp: RwLock<BTreeMap<(DateTime<Utc>, SourceId), KpObservation>>,
    selections: RwLock<BTreeMap<DateTime<Utc>, KpSelection>>,
    history: RwLock<BTreeMap<DateTime<Utc>, HistoryPoint>>,
    forecast: RwLock<BTreeMap<DateTime<Utc>, ForecastEntry>>,
    solar_wind: RwLock<BTreeMap<DateTime<Utc>, SolarWindSample>>,
    scales: RwLock<BTreeMap<DateTime<Utc>, ScaleReading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn kp_len(&self) -> usize {
        self.kp.read().await.len()
    }
}

#[async_trait]
impl SpaceWeatherStore for MemoryStore {
    async fn upsert_kp(&self, rows: &[KpObservation]) -> IngestResult<usize> {
        let mut kp = self.kp.write().await;
        for row in rows {
            kp.insert((row.timestamp, row.source), *row);
        }
        Ok(rows.len())
    }

    async fn query_kp(&self, since: DateTime<Utc>, source: Option<SourceId>) -> IngestResult<Vec<KpObservation>> {
        Ok(self
            .kp
            .read()
            .await
            .values()
            .filter(|o| o.timestamp >= since)
            .filter(|o| source.map_or(true, |s| o.source == s))
            .copied()
            .collect())
    }

    async fn record_selection(&self, selection: &KpSelection) -> IngestResult<()> {
        self.selections.write().await.insert(selection.resolved_at, *selection);
        Ok(())
    }

    async fn latest_selection(&self) -> IngestResult<Option<KpSelection>> {
        Ok(self.selections.read().await.values().next_back().copied())
    }

    async fn delete_kp_older_than(&self, cutoff: DateTime<Utc>) -> IngestResult<()> {
        self.kp.write().await.retain(|(ts, _), _| *ts >= cutoff);
        Ok(())
    }

    async fn upsert_history(&self, rows: &[HistoryPoint]) -> IngestResult<usize> {
        let mut history = self.history.write().await;
        for row in rows {
            history.insert(row.timestamp, *row);
        }
        Ok(rows.len())
    }

    async fn query_history(&self, since: DateTime<Utc>) -> IngestResult<Vec<HistoryPoint>> {
        Ok(self.history.read().await.range(since..).map(|(_, p)| *p).collect())
    }

    async fn upsert_forecast(&self, rows: &[ForecastEntry]) -> IngestResult<usize> {
        let mut forecast = self.forecast.write().await;
        for row in rows {
            forecast.insert(row.timestamp, row.clone());
        }
        Ok(rows.len())
    }

    async fn forecast_at(&self, at: DateTime<Utc>) -> IngestResult<Option<ForecastEntry>> {
        let earliest_start = at - forecast_window();
        Ok(self
            .forecast
            .read()
            .await
            .values()
            .find(|e| e.timestamp > earliest_start)
            .cloned())
    }

    async fn upsert_solar_wind(&self, rows: &[SolarWindSample]) -> IngestResult<usize> {
        let mut solar_wind = self.solar_wind.write().await;
        for row in rows {
            solar_wind.insert(row.timestamp, *row);
        }
        Ok(rows.len())
    }

    async fn latest_solar_wind(&self) -> IngestResult<Option<SolarWindSample>> {
        Ok(self.solar_wind.read().await.values().next_back().copied())
    }

    async fn record_scales(&self, reading: &ScaleReading) -> IngestResult<()> {
        self.scales.write().await.insert(reading.timestamp, *reading);
        Ok(())
    }

    async fn latest_scales(&self) -> IngestResult<Option<ScaleReading>> {
        Ok(self.scales.read().await.values().next_back().copied())
    }
}
