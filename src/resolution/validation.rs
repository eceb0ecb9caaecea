//! Freshness and anomaly checks for candidate series.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{NormalizedPoint, SourceDescriptor};

/// Tunable thresholds for candidate validation.
///
/// The anomaly lookback and threshold were chosen empirically; the defaults
/// preserve those values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationPolicy {
    /// Sub-hour sources whose latest bucket is at least this old are stale.
    pub max_age: chrono::Duration,
    /// Buckets preceding the latest one that are inspected for the zero glitch.
    pub anomaly_lookback: usize,
    /// A preceding value at or above this marks a trailing 0 as anomalous.
    pub anomaly_threshold: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_age: chrono::Duration::minutes(30),
            anomaly_lookback: 3,
            anomaly_threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Empty,
    Stale { age_minutes: i64 },
    AnomalousZero { preceding: f64 },
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::Empty => "empty",
            Rejection::Stale { .. } => "stale",
            Rejection::AnomalousZero { .. } => "anomalous_zero",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "no usable buckets"),
            Rejection::Stale { age_minutes } => {
                write!(f, "latest bucket is {} minutes old", age_minutes)
            }
            Rejection::AnomalousZero { preceding } => write!(
                f,
                "latest bucket is 0.0 right after {:.2}, treating as feed glitch",
                preceding
            ),
        }
    }
}

/// Validate `points` (ascending) from the source described by `descriptor`.
pub fn validate(
    descriptor: &SourceDescriptor,
    points: &[NormalizedPoint],
    now: DateTime<Utc>,
    policy: &ValidationPolicy,
) -> Result<(), Rejection> {
    let Some(latest) = points.last() else {
        return Err(Rejection::Empty);
    };

    if descriptor.is_sub_hour() {
        let age = now - latest.timestamp;
        if age >= policy.max_age {
            return Err(Rejection::Stale {
                age_minutes: age.num_minutes(),
            });
        }
    }

    if let Some(preceding) = anomalous_zero(points, policy) {
        return Err(Rejection::AnomalousZero { preceding });
    }

    Ok(())
}

/// Returns the offending preceding value when the latest bucket is an isolated 0.
fn anomalous_zero(points: &[NormalizedPoint], policy: &ValidationPolicy) -> Option<f64> {
    let (latest, earlier) = points.split_last()?;
    if latest.value != 0.0 {
        return None;
    }
    earlier
        .iter()
        .rev()
        .take(policy.anomaly_lookback)
        .map(|p| p.value)
        .find(|v| *v >= policy.anomaly_threshold)
}
