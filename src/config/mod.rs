//! Environment-driven configuration.

use std::env;

pub const DEFAULT_NOAA_BASE: &str = "https://services.swpc.noaa.gov";
pub const DEFAULT_GFZ_BASE: &str = "https://kp.gfz.de";
pub const DEFAULT_BOM_BASE: &str = "https://sws-data.sws.bom.gov.au";

/// Deployment environment name (`APP_ENV`), defaults to `sandbox`.
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_questdb_url() -> String {
    env::var("QUESTDB_URL")
        .unwrap_or_else(|_| "host=127.0.0.1 port=8812 user=admin password=quest dbname=qdb".to_string())
}

pub fn get_redis_url() -> String {
    env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string())
}

/// Provider base URLs. Overridable so tests can target a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub noaa_base: String,
    pub gfz_base: String,
    pub bom_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            noaa_base: DEFAULT_NOAA_BASE.to_string(),
            gfz_base: DEFAULT_GFZ_BASE.to_string(),
            bom_base: DEFAULT_BOM_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every provider at one base URL.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            noaa_base: base.clone(),
            gfz_base: base.clone(),
            bom_base: base,
        }
    }
}

/// Settings for the ingestion worker.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub interval_seconds: u64,
    pub endpoints: Endpoints,
    pub bom_api_key: Option<String>,
    /// Resolved Kp buckets older than this are dropped.
    pub kp_retention_hours: i64,
    pub http_port: u16,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 180,
            endpoints: Endpoints::default(),
            bom_api_key: None,
            kp_retention_hours: 12,
            http_port: 8080,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval_seconds: parse_env("INGEST_INTERVAL_SECONDS").unwrap_or(defaults.interval_seconds),
            endpoints: Endpoints {
                noaa_base: env::var("NOAA_BASE_URL").unwrap_or(defaults.endpoints.noaa_base),
                gfz_base: env::var("GFZ_BASE_URL").unwrap_or(defaults.endpoints.gfz_base),
                bom_base: env::var("BOM_BASE_URL").unwrap_or(defaults.endpoints.bom_base),
            },
            bom_api_key: env::var("BOM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            kp_retention_hours: parse_env("KP_RETENTION_HOURS").unwrap_or(defaults.kp_retention_hours),
            http_port: parse_env("PORT").unwrap_or(defaults.http_port),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
