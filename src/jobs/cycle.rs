//! One ingestion cycle: resolve Kp, refresh the auxiliary feeds, persist.
//!
//! The four tasks run concurrently and never fail each other; each reports
//! its own outcome. Cycles are non-reentrant: a trigger that arrives while a
//! cycle is still running is skipped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::db::SpaceWeatherStore;
use crate::error::{IngestError, IngestResult};
use crate::metrics::Metrics;
use crate::models::{SourceId, SourceOverride};
use crate::overrides::OverrideStore;
use crate::resolution::{FallbackSelector, SourceAttempt};
use crate::services::conditions::ConditionsClient;

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub source: SourceId,
    pub outcome: &'static str,
    pub detail: String,
    pub elapsed_ms: u64,
}

impl From<&SourceAttempt> for AttemptSummary {
    fn from(attempt: &SourceAttempt) -> Self {
        Self {
            source: attempt.source,
            outcome: attempt.outcome.label(),
            detail: attempt.outcome.to_string(),
            elapsed_ms: attempt.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KpTaskReport {
    pub source_override: String,
    pub selected: Option<SourceId>,
    pub rows: usize,
    pub attempts: Vec<AttemptSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KpTaskReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Ok { rows: usize },
    Failed { error: String },
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, TaskOutcome::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub kp: KpTaskReport,
    pub history: TaskOutcome,
    pub solar_wind: TaskOutcome,
    pub scales: TaskOutcome,
}

impl CycleReport {
    pub fn failed_tasks(&self) -> usize {
        [!self.kp.is_ok(), !self.history.is_ok(), !self.solar_wind.is_ok(), !self.scales.is_ok()]
            .iter()
            .filter(|failed| **failed)
            .count()
    }
}

pub struct IngestCycle {
    selector: FallbackSelector,
    conditions: ConditionsClient,
    store: Arc<dyn SpaceWeatherStore>,
    overrides: Arc<dyn OverrideStore>,
    metrics: Option<Arc<Metrics>>,
    retention: chrono::Duration,
    running: Mutex<()>,
    last_report: RwLock<Option<CycleReport>>,
}

impl IngestCycle {
    pub fn new(
        selector: FallbackSelector,
        conditions: ConditionsClient,
        store: Arc<dyn SpaceWeatherStore>,
        overrides: Arc<dyn OverrideStore>,
        retention_hours: i64,
    ) -> Self {
        Self {
            selector,
            conditions,
            store,
            overrides,
            metrics: None,
            retention: chrono::Duration::hours(retention_hours.max(1)),
            running: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }

    pub async fn run(&self) -> Option<CycleReport> {
        self.run_at(Utc::now()).await
    }

    /// Returns `None` when skipped because a cycle is already in flight.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Option<CycleReport> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Ingestion cycle already running, skipping trigger");
            if let Some(ref metrics) = self.metrics {
                metrics.ingest_cycles_skipped_total.inc();
            }
            return None;
        };

        let started = Instant::now();
        let (kp, history, solar_wind, scales) = tokio::join!(
            self.kp_task(now),
            self.history_task(),
            self.solar_wind_task(now),
            self.scales_task(now),
        );

        let report = CycleReport {
            started_at: now,
            duration_ms: started.elapsed().as_millis() as u64,
            kp,
            history: self.outcome("history", history),
            solar_wind: self.outcome("solar_wind", solar_wind),
            scales: self.outcome("scales", scales),
        };

        if let Some(ref metrics) = self.metrics {
            metrics.ingest_cycles_total.inc();
            metrics
                .ingest_cycle_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }

        info!(
            source = report.kp.selected.map(|s| s.as_str()).unwrap_or("none"),
            failed_tasks = report.failed_tasks(),
            duration_ms = report.duration_ms,
            "Ingestion cycle complete"
        );

        *self.last_report.write().await = Some(report.clone());
        Some(report)
    }

    async fn kp_task(&self, now: DateTime<Utc>) -> KpTaskReport {
        let source_override = match self.overrides.get_override().await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Could not read Kp source override, using automatic selection");
                SourceOverride::Auto
            }
        };

        let resolution = self.selector.resolve_at(source_override, now).await;
        self.record_attempts(&resolution.attempts);

        let mut report = KpTaskReport {
            source_override: source_override.to_string(),
            selected: resolution.selected_source(),
            rows: 0,
            attempts: resolution.attempts.iter().map(AttemptSummary::from).collect(),
            error: None,
        };

        let series = match resolution.into_series() {
            Ok(series) => series,
            Err(e) => {
                error!("No Kp source produced usable data this cycle");
                if let Some(ref metrics) = self.metrics {
                    metrics.kp_selection_exhausted_total.inc();
                }
                report.error = Some(e.to_string());
                return report;
            }
        };

        if let Some(ref metrics) = self.metrics {
            metrics
                .kp_source_selected_total
                .with_label_values(&[series.source.as_str()])
                .inc();
        }

        let observations = series.observations();
        match self.store.upsert_kp(&observations).await {
            Ok(written) => {
                report.rows = written;
                self.count_rows("kp_resolved", written);
                if written < observations.len() {
                    report.error = Some(
                        IngestError::Persistence(format!(
                            "{} of {} Kp rows written",
                            written,
                            observations.len()
                        ))
                        .to_string(),
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to persist resolved Kp");
                report.error = Some(e.to_string());
                return report;
            }
        }

        if report.rows > 0 {
            if let Err(e) = self.store.record_selection(&series.selection()).await {
                error!(error = %e, "Failed to record Kp selection");
                report.error.get_or_insert_with(|| e.to_string());
            }
        }

        if let Err(e) = self.store.delete_kp_older_than(now - self.retention).await {
            warn!(error = %e, "Kp retention sweep failed");
        }

        info!(source = %series.source, rows = report.rows, "Resolved Kp persisted");
        report
    }

    async fn history_task(&self) -> IngestResult<usize> {
        let (history, forecast) = tokio::try_join!(self.conditions.history(), self.conditions.forecast())?;

        let history_rows = self.store.upsert_history(&history).await?;
        self.count_rows("kp_history", history_rows);
        let forecast_rows = self.store.upsert_forecast(&forecast).await?;
        self.count_rows("kp_forecast", forecast_rows);

        Ok(history_rows + forecast_rows)
    }

    async fn solar_wind_task(&self, now: DateTime<Utc>) -> IngestResult<usize> {
        let samples = self.conditions.solar_wind(now).await?;
        let written = self.store.upsert_solar_wind(&samples).await?;
        self.count_rows("solar_wind", written);
        Ok(written)
    }

    async fn scales_task(&self, now: DateTime<Utc>) -> IngestResult<usize> {
        let reading = self.conditions.scales(now).await?;
        self.store.record_scales(&reading).await?;
        self.count_rows("noaa_scales", 1);
        Ok(1)
    }

    fn outcome(&self, task: &str, result: IngestResult<usize>) -> TaskOutcome {
        match result {
            Ok(rows) => TaskOutcome::Ok { rows },
            Err(e) => {
                error!(task = %task, error = %e, "Ingestion task failed");
                if let Some(ref metrics) = self.metrics {
                    metrics.task_failures_total.with_label_values(&[task]).inc();
                }
                TaskOutcome::Failed { error: e.to_string() }
            }
        }
    }

    fn record_attempts(&self, attempts: &[SourceAttempt]) {
        let Some(ref metrics) = self.metrics else {
            return;
        };
        for attempt in attempts {
            if let Some(reason) = attempt.outcome.reason() {
                metrics
                    .kp_source_failures_total
                    .with_label_values(&[attempt.source.as_str(), reason])
                    .inc();
            }
        }
    }

    fn count_rows(&self, table: &str, rows: usize) {
        if let Some(ref metrics) = self.metrics {
            metrics
                .rows_written_total
                .with_label_values(&[table])
                .inc_by(rows as u64);
        }
    }
}
