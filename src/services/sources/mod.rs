//! Kp source adapters.
//!
//! Every provider sits behind [`KpSourceAdapter`]. [`ProviderAdapter`] maps a
//! [`SourceId`] variant to the module that knows that provider's payload shape;
//! adding a source means adding a variant and a parser module.

pub mod bom;
pub mod boulder;
pub mod forecast;
pub mod gfz;
pub mod noaa_estimated;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{Endpoints, IngestConfig};
use crate::error::IngestResult;
use crate::models::{NormalizedPoint, RawSample, SourceDescriptor, SourceId};
use crate::resolution::bucket::bucketize;
use crate::services::fetch::JsonFetcher;

/// Capability contract shared by all Kp providers: fetch, parse, bucketize.
#[async_trait]
pub trait KpSourceAdapter: Send + Sync {
    fn descriptor(&self) -> SourceDescriptor;

    /// Canonical buckets, ascending. Fails closed on any fetch error.
    async fn fetch_buckets(&self) -> IngestResult<Vec<NormalizedPoint>>;
}

/// Live adapter for one of the known providers.
pub struct ProviderAdapter {
    source: SourceId,
    fetcher: JsonFetcher,
    endpoints: Endpoints,
    bom_api_key: Option<String>,
}

impl ProviderAdapter {
    pub fn new(
        source: SourceId,
        fetcher: JsonFetcher,
        endpoints: Endpoints,
        bom_api_key: Option<String>,
    ) -> Self {
        Self {
            source,
            fetcher,
            endpoints,
            bom_api_key,
        }
    }

    /// Raw samples before bucketing.
    pub async fn fetch_samples(&self) -> IngestResult<Vec<RawSample>> {
        let timeout = self.source.descriptor().fetch_timeout;
        match self.source {
            SourceId::NoaaEstimated => {
                noaa_estimated::fetch(&self.fetcher, &self.endpoints.noaa_base, timeout).await
            }
            SourceId::NoaaBoulder => {
                boulder::fetch(&self.fetcher, &self.endpoints.noaa_base, timeout).await
            }
            SourceId::NoaaForecast => {
                let entries =
                    forecast::fetch(&self.fetcher, &self.endpoints.noaa_base, timeout).await?;
                Ok(forecast::estimated_samples(&entries))
            }
            SourceId::Gfz => {
                gfz::fetch(&self.fetcher, &self.endpoints.gfz_base, Utc::now(), timeout).await
            }
            SourceId::Bom => {
                bom::fetch(
                    &self.fetcher,
                    &self.endpoints.bom_base,
                    self.bom_api_key.as_deref(),
                    Utc::now(),
                    timeout,
                )
                .await
            }
        }
    }
}

#[async_trait]
impl KpSourceAdapter for ProviderAdapter {
    fn descriptor(&self) -> SourceDescriptor {
        self.source.descriptor()
    }

    async fn fetch_buckets(&self) -> IngestResult<Vec<NormalizedPoint>> {
        let samples = self.fetch_samples().await?;
        Ok(bucketize(samples, self.source.descriptor().bucket_width))
    }
}

/// Adapters indexed by source, kept in priority order.
#[derive(Clone)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn KpSourceAdapter>>,
}

impl SourceRegistry {
    /// All five live providers.
    pub fn live(config: &IngestConfig, fetcher: JsonFetcher) -> Self {
        let adapters = SourceId::PRIORITY
            .iter()
            .map(|id| {
                Arc::new(ProviderAdapter::new(
                    *id,
                    fetcher.clone(),
                    config.endpoints.clone(),
                    config.bom_api_key.clone(),
                )) as Arc<dyn KpSourceAdapter>
            })
            .collect();
        Self { adapters }
    }

    pub fn from_adapters(mut adapters: Vec<Arc<dyn KpSourceAdapter>>) -> Self {
        adapters.sort_by_key(|a| a.descriptor().priority_rank);
        Self { adapters }
    }

    pub fn get(&self, id: SourceId) -> Option<&Arc<dyn KpSourceAdapter>> {
        self.adapters.iter().find(|a| a.descriptor().id == id)
    }

    pub fn in_priority_order(&self) -> impl Iterator<Item = &Arc<dyn KpSourceAdapter>> {
        self.adapters.iter()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Parse a provider timestamp. Values without an offset are taken as UTC;
/// `T` and space separators and optional fractional seconds are accepted.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|n| n.and_utc())
}

/// Numeric field that providers send either as a JSON number or a string.
pub fn finite_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
