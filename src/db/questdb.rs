//! QuestDB persistence over the PostgreSQL wire protocol.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info, warn};

use super::{forecast_window, SpaceWeatherStore, WRITE_BATCH_SIZE};
use crate::error::{IngestError, IngestResult};
use crate::models::{
    ForecastEntry, ForecastKind, HistoryPoint, KpObservation, KpSelection, ScaleReading, SolarWindSample,
    SourceId,
};

const CONNECT_ATTEMPTS: usize = 5;

type Param = Box<dyn ToSql + Sync + Send>;

fn param<T: ToSql + Sync + Send + 'static>(value: T) -> Param {
    Box::new(value)
}

// DEDUP UPSERT KEYS makes re-inserting a (ts, source) pair replace the row.
const SCHEMA: &[(&str, &str)] = &[
    (
        "kp_resolved",
        "CREATE TABLE IF NOT EXISTS kp_resolved (
            ts TIMESTAMP,
            source SYMBOL,
            kp DOUBLE,
            sample_count INT
        ) TIMESTAMP(ts) PARTITION BY HOUR WAL DEDUP UPSERT KEYS(ts, source)",
    ),
    (
        "kp_selection",
        "CREATE TABLE IF NOT EXISTS kp_selection (
            ts TIMESTAMP,
            source SYMBOL
        ) TIMESTAMP(ts) PARTITION BY DAY WAL DEDUP UPSERT KEYS(ts)",
    ),
    (
        "kp_history",
        "CREATE TABLE IF NOT EXISTS kp_history (
            ts TIMESTAMP,
            kp DOUBLE
        ) TIMESTAMP(ts) PARTITION BY DAY WAL DEDUP UPSERT KEYS(ts)",
    ),
    (
        "kp_forecast",
        "CREATE TABLE IF NOT EXISTS kp_forecast (
            ts TIMESTAMP,
            kp DOUBLE,
            kind SYMBOL,
            noaa_scale STRING
        ) TIMESTAMP(ts) PARTITION BY DAY WAL DEDUP UPSERT KEYS(ts)",
    ),
    (
        "solar_wind",
        "CREATE TABLE IF NOT EXISTS solar_wind (
            ts TIMESTAMP,
            speed DOUBLE,
            density DOUBLE,
            temperature DOUBLE,
            bt DOUBLE,
            bz DOUBLE
        ) TIMESTAMP(ts) PARTITION BY DAY WAL DEDUP UPSERT KEYS(ts)",
    ),
    (
        "noaa_scales",
        "CREATE TABLE IF NOT EXISTS noaa_scales (
            ts TIMESTAMP,
            r INT,
            s INT,
            g INT
        ) TIMESTAMP(ts) PARTITION BY DAY WAL DEDUP UPSERT KEYS(ts)",
    ),
];

pub struct QuestDatabase {
    client: Client,
}

impl QuestDatabase {
    /// Connect with exponential backoff, then create any missing tables.
    pub async fn connect(url: &str) -> IngestResult<Self> {
        let client = (|| open(url))
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_times(CONNECT_ATTEMPTS),
            )
            .notify(|err: &IngestError, retry_in: Duration| {
                warn!(error = %err, retry_in_ms = retry_in.as_millis() as u64, "QuestDB connection failed, retrying");
            })
            .await?;

        let db = Self { client };
        db.init_schema().await?;
        info!("Connected to QuestDB");
        Ok(db)
    }

    async fn init_schema(&self) -> IngestResult<()> {
        for (table, ddl) in SCHEMA {
            self.client
                .execute(*ddl, &[])
                .await
                .map_err(|e| IngestError::persistence(&format!("failed to create {} table", table), e))?;
        }
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        !self.client.is_closed()
    }

    /// Run one multi-row insert per chunk. Returns rows written.
    async fn write_batches<T, F>(&self, table: &str, columns: &[&str], rows: &[T], bind: F) -> usize
    where
        T: Sync,
        F: Fn(&T) -> Vec<Param>,
    {
        let mut written = 0;
        for (batch_no, chunk) in rows.chunks(WRITE_BATCH_SIZE).enumerate() {
            let owned: Vec<Param> = chunk.iter().flat_map(&bind).collect();
            let params: Vec<&(dyn ToSql + Sync)> = owned.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {}",
                table,
                columns.join(", "),
                values_clause(chunk.len(), columns.len())
            );

            match self.client.execute(sql.as_str(), &params).await {
                Ok(_) => written += chunk.len(),
                Err(e) => {
                    error!(table = %table, batch = batch_no, rows = chunk.len(), error = %e, "Batch write failed");
                }
            }
        }
        debug!(table = %table, written, total = rows.len(), "Batches written");
        written
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IngestResult<Vec<Row>> {
        self.client
            .query(sql, params)
            .await
            .map_err(|e| IngestError::persistence("query failed", e))
    }
}

async fn open(url: &str) -> IngestResult<Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(|e| IngestError::persistence("failed to connect to QuestDB", e))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "QuestDB connection error");
        }
    });

    Ok(client)
}

/// `($1, $2), ($3, $4), ...` for `rows` rows of `cols` columns.
fn values_clause(rows: usize, cols: usize) -> String {
    (0..rows)
        .map(|r| {
            let placeholders: Vec<String> = (1..=cols).map(|c| format!("${}", r * cols + c)).collect();
            format!("({})", placeholders.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn naive(ts: DateTime<Utc>) -> NaiveDateTime {
    ts.naive_utc()
}

fn utc(row: &Row, idx: usize) -> DateTime<Utc> {
    let ts: NaiveDateTime = row.get(idx);
    DateTime::from_naive_utc_and_offset(ts, Utc)
}

fn solar_wind_from_row(row: &Row) -> SolarWindSample {
    SolarWindSample {
        timestamp: utc(row, 0),
        speed: row.get(1),
        density: row.get(2),
        temperature: row.get(3),
        bt: row.get(4),
        bz: row.get(5),
    }
}

fn level(row: &Row, idx: usize) -> u8 {
    let value: Option<i32> = row.get(idx);
    value.unwrap_or(0).clamp(0, 5) as u8
}

#[async_trait]
impl SpaceWeatherStore for QuestDatabase {
    async fn upsert_kp(&self, rows: &[KpObservation]) -> IngestResult<usize> {
        Ok(self
            .write_batches("kp_resolved", &["ts", "source", "kp", "sample_count"], rows, |o| {
                vec![
                    param(naive(o.timestamp)),
                    param(o.source.as_str()),
                    param(o.value),
                    param(o.sample_count as i32),
                ]
            })
            .await)
    }

    async fn query_kp(&self, since: DateTime<Utc>, source: Option<SourceId>) -> IngestResult<Vec<KpObservation>> {
        let since = naive(since);
        let rows = match source {
            Some(source) => {
                self.query(
                    "SELECT ts, source, kp, sample_count FROM kp_resolved
                     WHERE ts >= $1 AND source = $2
                     ORDER BY ts ASC",
                    &[&since, &source.as_str()],
                )
                .await?
            }
            None => {
                self.query(
                    "SELECT ts, source, kp, sample_count FROM kp_resolved
                     WHERE ts >= $1
                     ORDER BY ts ASC",
                    &[&since],
                )
                .await?
            }
        };

        Ok(rows
            .iter()
            .filter_map(|row| {
                let source: String = row.get(1);
                let source = match source.parse::<SourceId>() {
                    Ok(id) => id,
                    Err(_) => {
                        warn!(source = %source, "Skipping Kp row with unknown source");
                        return None;
                    }
                };
                let sample_count: i32 = row.get(3);
                Some(KpObservation {
                    timestamp: utc(row, 0),
                    value: row.get(2),
                    sample_count: sample_count.max(1) as u32,
                    source,
                })
            })
            .collect())
    }

    async fn record_selection(&self, selection: &KpSelection) -> IngestResult<()> {
        self.client
            .execute(
                "INSERT INTO kp_selection (ts, source) VALUES ($1, $2)",
                &[&naive(selection.resolved_at), &selection.source.as_str()],
            )
            .await
            .map_err(|e| IngestError::persistence("failed to record Kp selection", e))?;
        Ok(())
    }

    async fn latest_selection(&self) -> IngestResult<Option<KpSelection>> {
        let rows = self
            .query("SELECT ts, source FROM kp_selection ORDER BY ts DESC LIMIT 1", &[])
            .await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let source: String = row.get(1);
        match source.parse::<SourceId>() {
            Ok(source) => Ok(Some(KpSelection {
                source,
                resolved_at: utc(row, 0),
            })),
            Err(_) => {
                warn!(source = %source, "Ignoring Kp selection with unknown source");
                Ok(None)
            }
        }
    }

    async fn delete_kp_older_than(&self, cutoff: DateTime<Utc>) -> IngestResult<()> {
        // Partition-granular: whole hours strictly before the cutoff are dropped.
        let sql = format!(
            "ALTER TABLE kp_resolved DROP PARTITION WHERE ts < '{}'",
            cutoff.format("%Y-%m-%dT%H:%M:%S%.6fZ")
        );
        match self.client.execute(sql.as_str(), &[]).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("no partitions") => {
                debug!(cutoff = %cutoff, "No Kp partitions old enough to drop");
                Ok(())
            }
            Err(e) => Err(IngestError::persistence("failed to drop old Kp partitions", e)),
        }
    }

    async fn upsert_history(&self, rows: &[HistoryPoint]) -> IngestResult<usize> {
        Ok(self
            .write_batches("kp_history", &["ts", "kp"], rows, |p| {
                vec![param(naive(p.timestamp)), param(p.value)]
            })
            .await)
    }

    async fn query_history(&self, since: DateTime<Utc>) -> IngestResult<Vec<HistoryPoint>> {
        let rows = self
            .query(
                "SELECT ts, kp FROM kp_history WHERE ts >= $1 ORDER BY ts ASC",
                &[&naive(since)],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| HistoryPoint {
                timestamp: utc(row, 0),
                value: row.get(1),
            })
            .collect())
    }

    async fn upsert_forecast(&self, rows: &[ForecastEntry]) -> IngestResult<usize> {
        Ok(self
            .write_batches("kp_forecast", &["ts", "kp", "kind", "noaa_scale"], rows, |e| {
                vec![
                    param(naive(e.timestamp)),
                    param(e.value),
                    param(e.kind.as_str()),
                    param(e.noaa_scale.clone()),
                ]
            })
            .await)
    }

    async fn forecast_at(&self, at: DateTime<Utc>) -> IngestResult<Option<ForecastEntry>> {
        let rows = self
            .query(
                "SELECT ts, kp, kind, noaa_scale FROM kp_forecast
                 WHERE ts > $1
                 ORDER BY ts ASC
                 LIMIT 1",
                &[&naive(at - forecast_window())],
            )
            .await?;

        Ok(rows.first().and_then(|row| {
            let kind: String = row.get(2);
            Some(ForecastEntry {
                timestamp: utc(row, 0),
                value: row.get(1),
                kind: ForecastKind::parse(&kind)?,
                noaa_scale: row.get(3),
            })
        }))
    }

    async fn upsert_solar_wind(&self, rows: &[SolarWindSample]) -> IngestResult<usize> {
        Ok(self
            .write_batches(
                "solar_wind",
                &["ts", "speed", "density", "temperature", "bt", "bz"],
                rows,
                |s| {
                    vec![
                        param(naive(s.timestamp)),
                        param(s.speed),
                        param(s.density),
                        param(s.temperature),
                        param(s.bt),
                        param(s.bz),
                    ]
                },
            )
            .await)
    }

    async fn latest_solar_wind(&self) -> IngestResult<Option<SolarWindSample>> {
        let rows = self
            .query(
                "SELECT ts, speed, density, temperature, bt, bz FROM solar_wind
                 ORDER BY ts DESC
                 LIMIT 1",
                &[],
            )
            .await?;
        Ok(rows.first().map(solar_wind_from_row))
    }

    async fn record_scales(&self, reading: &ScaleReading) -> IngestResult<()> {
        self.client
            .execute(
                "INSERT INTO noaa_scales (ts, r, s, g) VALUES ($1, $2, $3, $4)",
                &[
                    &naive(reading.timestamp),
                    &(reading.radio_blackout as i32),
                    &(reading.solar_radiation as i32),
                    &(reading.geomagnetic_storm as i32),
                ],
            )
            .await
            .map_err(|e| IngestError::persistence("failed to record scales", e))?;
        Ok(())
    }

    async fn latest_scales(&self) -> IngestResult<Option<ScaleReading>> {
        let rows = self
            .query("SELECT ts, r, s, g FROM noaa_scales ORDER BY ts DESC LIMIT 1", &[])
            .await?;
        Ok(rows.first().map(|row| ScaleReading {
            timestamp: utc(row, 0),
            radio_blackout: level(row, 1),
            solar_radiation: level(row, 2),
            geomagnetic_storm: level(row, 3),
        }))
    }
}
