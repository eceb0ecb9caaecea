//! Side-by-side health view of every Kp source.

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use serde::Serialize;

use crate::models::SourceId;
use crate::resolution::fetch_bounded;
use crate::services::sources::SourceRegistry;

/// Sources whose newest bucket is older than this report `stale`.
pub const STALE_AFTER_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Stale,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub source: SourceId,
    pub label: &'static str,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latest_value: Option<f64>,
    pub latest_time: Option<DateTime<Utc>>,
    pub point_count: usize,
}

pub struct SourceProbe {
    registry: SourceRegistry,
}

impl SourceProbe {
    pub fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    pub async fn probe_all(&self) -> Vec<SourceStatus> {
        self.probe_all_at(Utc::now()).await
    }

    /// Fetch every source concurrently. Results keep priority order.
    pub async fn probe_all_at(&self, now: DateTime<Utc>) -> Vec<SourceStatus> {
        let probes = self.registry.in_priority_order().map(|adapter| async move {
            let descriptor = adapter.descriptor();
            match fetch_bounded(adapter.as_ref()).await {
                Ok(points) => {
                    let latest = points.last();
                    let status = match latest {
                        Some(p) if now - p.timestamp <= Duration::hours(STALE_AFTER_HOURS) => ProbeStatus::Ok,
                        _ => ProbeStatus::Stale,
                    };
                    SourceStatus {
                        source: descriptor.id,
                        label: descriptor.label,
                        status,
                        error: None,
                        latest_value: latest.map(|p| p.value),
                        latest_time: latest.map(|p| p.timestamp),
                        point_count: points.len(),
                    }
                }
                Err(e) => SourceStatus {
                    source: descriptor.id,
                    label: descriptor.label,
                    status: ProbeStatus::Error,
                    error: Some(e.to_string()),
                    latest_value: None,
                    latest_time: None,
                    point_count: 0,
                },
            }
        });

        join_all(probes).await
    }
}
