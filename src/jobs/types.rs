//! Job payloads pushed onto the Redis queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingestion cycle, enqueued on every scheduler tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCycleJob {
    pub scheduled_for: DateTime<Utc>,
}

impl IngestCycleJob {
    pub fn new(scheduled_for: DateTime<Utc>) -> Self {
        Self { scheduled_for }
    }
}
