//! Fixed-width time bucketing of raw samples.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::{NormalizedPoint, RawSample};

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Start of the bucket containing `timestamp`: `floor(ts / width) * width` in UTC.
pub fn bucket_start(timestamp: DateTime<Utc>, width: Duration) -> DateTime<Utc> {
    let width_secs = width.as_secs().max(1) as i64;
    let key = timestamp.timestamp().div_euclid(width_secs) * width_secs;
    DateTime::from_timestamp(key, 0).unwrap_or(timestamp)
}

/// Fold samples into mean-valued buckets of `width`.
///
/// Empty buckets are omitted, output is ascending by timestamp, and each
/// value is the group mean rounded to 2 decimals. Non-finite samples are skipped.
pub fn bucketize<I>(samples: I, width: Duration) -> Vec<NormalizedPoint>
where
    I: IntoIterator<Item = RawSample>,
{
    let mut groups: BTreeMap<DateTime<Utc>, (f64, u32)> = BTreeMap::new();

    for sample in samples {
        if !sample.value.is_finite() {
            continue;
        }
        let entry = groups
            .entry(bucket_start(sample.timestamp, width))
            .or_insert((0.0, 0));
        entry.0 += sample.value;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(timestamp, (sum, count))| {
            NormalizedPoint::new(timestamp, round2(sum / count as f64), count)
        })
        .collect()
}
