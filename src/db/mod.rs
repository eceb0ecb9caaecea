//! Persistence for resolved Kp buckets and the auxiliary feeds.

pub mod memory;
pub mod questdb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::IngestResult;
use crate::models::{
    ForecastEntry, HistoryPoint, KpObservation, KpSelection, ScaleReading, SolarWindSample, SourceId,
};

pub use memory::MemoryStore;
pub use questdb::QuestDatabase;

/// Rows per write statement. Batches are independent: a failed batch is
/// logged and skipped without undoing earlier ones.
pub const WRITE_BATCH_SIZE: usize = 50;

/// Storage seam for the ingestion cycle and the read-side helpers.
///
/// Every `upsert_*` is keyed on timestamp (plus source for Kp) so rewriting
/// the same cycle is idempotent. Each returns the number of rows written.
#[async_trait]
pub trait SpaceWeatherStore: Send + Sync {
    async fn upsert_kp(&self, rows: &[KpObservation]) -> IngestResult<usize>;

    /// Buckets at or after `since`, ascending, optionally for one source.
    async fn query_kp(&self, since: DateTime<Utc>, source: Option<SourceId>) -> IngestResult<Vec<KpObservation>>;

    /// Record the source a cycle committed. Written after its Kp rows.
    async fn record_selection(&self, selection: &KpSelection) -> IngestResult<()>;

    async fn latest_selection(&self) -> IngestResult<Option<KpSelection>>;

    async fn delete_kp_older_than(&self, cutoff: DateTime<Utc>) -> IngestResult<()>;

    async fn upsert_history(&self, rows: &[HistoryPoint]) -> IngestResult<usize>;

    async fn query_history(&self, since: DateTime<Utc>) -> IngestResult<Vec<HistoryPoint>>;

    async fn upsert_forecast(&self, rows: &[ForecastEntry]) -> IngestResult<usize>;

    /// The 3-hour window containing `at`, or the next one after it.
    async fn forecast_at(&self, at: DateTime<Utc>) -> IngestResult<Option<ForecastEntry>>;

    async fn upsert_solar_wind(&self, rows: &[SolarWindSample]) -> IngestResult<usize>;

    async fn latest_solar_wind(&self) -> IngestResult<Option<SolarWindSample>>;

    async fn record_scales(&self, reading: &ScaleReading) -> IngestResult<()>;

    async fn latest_scales(&self) -> IngestResult<Option<ScaleReading>>;
}

/// Length of one forecast window.
pub fn forecast_window() -> chrono::Duration {
    chrono::Duration::hours(3)
}
