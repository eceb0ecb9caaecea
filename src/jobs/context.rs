//! Job context for dependency injection

use crate::jobs::cycle::IngestCycle;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Context passed to job handlers via Apalis Data<T> pattern
pub struct JobContext {
    pub cycle: Arc<IngestCycle>,
    pub metrics: Option<Arc<Metrics>>,
    /// Jobs scheduled further in the past than this are dropped (queue backlog).
    pub max_job_lag: chrono::Duration,
}

impl JobContext {
    pub fn new(cycle: Arc<IngestCycle>, metrics: Option<Arc<Metrics>>, interval_seconds: u64) -> Self {
        Self {
            cycle,
            metrics,
            max_job_lag: chrono::Duration::seconds(interval_seconds.max(1) as i64 * 2),
        }
    }
}
