use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::SourceId;

/// A single provider reading before bucketing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub sample_count: u32,
}

impl NormalizedPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64, sample_count: u32) -> Self {
        Self {
            timestamp,
            value,
            sample_count,
        }
    }
}

impl From<&NormalizedPoint> for RawSample {
    fn from(point: &NormalizedPoint) -> Self {
        RawSample::new(point.timestamp, point.value)
    }
}

/// Output of one successful fallback resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSeries {
    pub source: SourceId,
    pub points: Vec<NormalizedPoint>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedSeries {
    pub fn latest(&self) -> Option<&NormalizedPoint> {
        self.points.last()
    }

    pub fn selection(&self) -> KpSelection {
        KpSelection {
            source: self.source,
            resolved_at: self.resolved_at,
        }
    }

    /// Rows ready for persistence, tagged with the winning source.
    pub fn observations(&self) -> Vec<KpObservation> {
        self.points
            .iter()
            .map(|p| KpObservation {
                timestamp: p.timestamp,
                value: p.value,
                sample_count: p.sample_count,
                source: self.source,
            })
            .collect()
    }
}

/// A committed Kp bucket as stored and read back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpObservation {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub sample_count: u32,
    pub source: SourceId,
}

/// Which source the most recent cycle committed. Readers follow it so a
/// source that later lost selection is not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpSelection {
    pub source: SourceId,
    pub resolved_at: DateTime<Utc>,
}
