//! Known Kp providers and the operator override.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::IngestError;

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
const THIRTY_MINUTES: Duration = Duration::from_secs(30 * 60);
const THREE_HOURS: Duration = Duration::from_secs(3 * 60 * 60);

/// Closed set of Kp sources, declared in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    NoaaEstimated,
    NoaaBoulder,
    NoaaForecast,
    Gfz,
    Bom,
}

impl SourceId {
    /// Fallback order used in automatic mode.
    pub const PRIORITY: [SourceId; 5] = [
        SourceId::NoaaEstimated,
        SourceId::NoaaBoulder,
        SourceId::NoaaForecast,
        SourceId::Gfz,
        SourceId::Bom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::NoaaEstimated => "noaa_estimated",
            SourceId::NoaaBoulder => "noaa_boulder",
            SourceId::NoaaForecast => "noaa_forecast",
            SourceId::Gfz => "gfz",
            SourceId::Bom => "bom",
        }
    }

    pub fn descriptor(&self) -> SourceDescriptor {
        match self {
            SourceId::NoaaEstimated => SourceDescriptor {
                id: *self,
                label: "NOAA Estimated Kp",
                priority_rank: 0,
                native_resolution: Duration::from_secs(60),
                bucket_width: FIFTEEN_MINUTES,
                fetch_timeout: Duration::from_secs(12),
                independent_infrastructure: false,
            },
            SourceId::NoaaBoulder => SourceDescriptor {
                id: *self,
                label: "NOAA Boulder K-index",
                priority_rank: 1,
                native_resolution: Duration::from_secs(60),
                bucket_width: FIFTEEN_MINUTES,
                fetch_timeout: Duration::from_secs(12),
                independent_infrastructure: false,
            },
            SourceId::NoaaForecast => SourceDescriptor {
                id: *self,
                label: "NOAA Kp Forecast",
                priority_rank: 2,
                native_resolution: THREE_HOURS,
                bucket_width: THREE_HOURS,
                fetch_timeout: Duration::from_secs(15),
                independent_infrastructure: false,
            },
            SourceId::Gfz => SourceDescriptor {
                id: *self,
                label: "GFZ Potsdam Hp30",
                priority_rank: 3,
                native_resolution: THIRTY_MINUTES,
                bucket_width: FIFTEEN_MINUTES,
                fetch_timeout: Duration::from_secs(12),
                independent_infrastructure: true,
            },
            SourceId::Bom => SourceDescriptor {
                id: *self,
                label: "Australian BoM K-index",
                priority_rank: 4,
                native_resolution: THREE_HOURS,
                bucket_width: FIFTEEN_MINUTES,
                fetch_timeout: Duration::from_secs(15),
                independent_infrastructure: true,
            },
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "noaa_estimated" | "noaa" => Ok(SourceId::NoaaEstimated),
            "noaa_boulder" => Ok(SourceId::NoaaBoulder),
            "noaa_forecast" => Ok(SourceId::NoaaForecast),
            "gfz" => Ok(SourceId::Gfz),
            "bom" => Ok(SourceId::Bom),
            other => Err(IngestError::Config(format!(
                "unknown Kp source '{}' (valid: auto, {})",
                other,
                SourceId::PRIORITY
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Static facts about a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub label: &'static str,
    pub priority_rank: u8,
    pub native_resolution: Duration,
    pub bucket_width: Duration,
    pub fetch_timeout: Duration,
    pub independent_infrastructure: bool,
}

impl SourceDescriptor {
    /// Sub-hour sources are subject to the freshness check.
    pub fn is_sub_hour(&self) -> bool {
        self.native_resolution < Duration::from_secs(60 * 60)
    }
}

/// Operator-selected source, or automatic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceOverride {
    #[default]
    Auto,
    Pinned(SourceId),
}

impl SourceOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOverride::Auto => "auto",
            SourceOverride::Pinned(id) => id.as_str(),
        }
    }
}

impl fmt::Display for SourceOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceOverride {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "auto" {
            return Ok(SourceOverride::Auto);
        }
        trimmed.parse().map(SourceOverride::Pinned)
    }
}
