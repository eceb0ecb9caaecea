//! Priority-ordered source selection with an operator override.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::models::{NormalizedPoint, ResolvedSeries, SourceId, SourceOverride};
use crate::resolution::validation::{validate, Rejection, ValidationPolicy};
use crate::services::sources::{KpSourceAdapter, SourceRegistry};

#[derive(Debug)]
pub enum AttemptOutcome {
    Selected { points: usize },
    Rejected(Rejection),
    Failed(IngestError),
}

impl AttemptOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, AttemptOutcome::Selected { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Selected { .. } => "selected",
            AttemptOutcome::Rejected(_) => "rejected",
            AttemptOutcome::Failed(_) => "failed",
        }
    }

    /// Reason used as the `reason` metrics label for unsuccessful attempts.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AttemptOutcome::Selected { .. } => None,
            AttemptOutcome::Rejected(rejection) => Some(rejection.kind()),
            AttemptOutcome::Failed(err) => Some(err.kind()),
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Selected { points } => write!(f, "selected with {} buckets", points),
            AttemptOutcome::Rejected(rejection) => write!(f, "rejected: {}", rejection),
            AttemptOutcome::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

#[derive(Debug)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// Result of one selection pass. `series == None` means every source was exhausted.
#[derive(Debug, Default)]
pub struct Resolution {
    pub series: Option<ResolvedSeries>,
    pub attempts: Vec<SourceAttempt>,
}

impl Resolution {
    pub fn is_exhausted(&self) -> bool {
        self.series.is_none()
    }

    pub fn selected_source(&self) -> Option<SourceId> {
        self.series.as_ref().map(|s| s.source)
    }

    pub fn into_series(self) -> IngestResult<ResolvedSeries> {
        self.series.ok_or(IngestError::SelectionExhausted)
    }
}

pub struct FallbackSelector {
    registry: SourceRegistry,
    policy: ValidationPolicy,
}

impl FallbackSelector {
    pub fn new(registry: SourceRegistry) -> Self {
        Self::with_policy(registry, ValidationPolicy::default())
    }

    pub fn with_policy(registry: SourceRegistry, policy: ValidationPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub async fn resolve(&self, source_override: SourceOverride) -> Resolution {
        self.resolve_at(source_override, Utc::now()).await
    }

    /// Resolve against an explicit clock.
    ///
    /// A pinned source that yields at least one bucket wins without
    /// validation. Otherwise sources are tried one at a time in priority
    /// order and the first that validates is returned. A pinned source that
    /// already failed this pass is not retried.
    pub async fn resolve_at(&self, source_override: SourceOverride, now: DateTime<Utc>) -> Resolution {
        let mut resolution = Resolution::default();
        let mut tried = None;

        if let SourceOverride::Pinned(id) = source_override {
            match self.registry.get(id) {
                Some(adapter) => {
                    tried = Some(id);
                    let started = Instant::now();
                    match fetch_bounded(adapter.as_ref()).await {
                        Ok(points) if !points.is_empty() => {
                            info!(source = %id, buckets = points.len(), "Kp resolved from override source");
                            resolution.attempts.push(SourceAttempt {
                                source: id,
                                outcome: AttemptOutcome::Selected { points: points.len() },
                                elapsed: started.elapsed(),
                            });
                            resolution.series = Some(ResolvedSeries {
                                source: id,
                                points,
                                resolved_at: now,
                            });
                            return resolution;
                        }
                        Ok(_) => {
                            warn!(source = %id, "Override source returned no data, falling back to automatic selection");
                            resolution.attempts.push(SourceAttempt {
                                source: id,
                                outcome: AttemptOutcome::Rejected(Rejection::Empty),
                                elapsed: started.elapsed(),
                            });
                        }
                        Err(e) => {
                            warn!(source = %id, error = %e, "Override source failed, falling back to automatic selection");
                            resolution.attempts.push(SourceAttempt {
                                source: id,
                                outcome: AttemptOutcome::Failed(e),
                                elapsed: started.elapsed(),
                            });
                        }
                    }
                }
                None => {
                    warn!(source = %id, "Override source is not registered, using automatic selection");
                }
            }
        }

        for adapter in self.registry.in_priority_order() {
            let descriptor = adapter.descriptor();
            if tried == Some(descriptor.id) {
                continue;
            }

            let started = Instant::now();
            let points = match fetch_bounded(adapter.as_ref()).await {
                Ok(points) => points,
                Err(e) => {
                    warn!(source = %descriptor.id, error = %e, "Kp source fetch failed");
                    resolution.attempts.push(SourceAttempt {
                        source: descriptor.id,
                        outcome: AttemptOutcome::Failed(e),
                        elapsed: started.elapsed(),
                    });
                    continue;
                }
            };

            match validate(&descriptor, &points, now, &self.policy) {
                Ok(()) => {
                    info!(
                        source = %descriptor.id,
                        buckets = points.len(),
                        latest = points.last().map(|p| p.value).unwrap_or_default(),
                        "Kp resolved"
                    );
                    resolution.attempts.push(SourceAttempt {
                        source: descriptor.id,
                        outcome: AttemptOutcome::Selected { points: points.len() },
                        elapsed: started.elapsed(),
                    });
                    resolution.series = Some(ResolvedSeries {
                        source: descriptor.id,
                        points,
                        resolved_at: now,
                    });
                    return resolution;
                }
                Err(rejection) => {
                    warn!(source = %descriptor.id, reason = %rejection, "Kp source rejected");
                    resolution.attempts.push(SourceAttempt {
                        source: descriptor.id,
                        outcome: AttemptOutcome::Rejected(rejection),
                        elapsed: started.elapsed(),
                    });
                }
            }
        }

        warn!(attempts = resolution.attempts.len(), "All Kp sources exhausted");
        resolution
    }
}

/// Fetch buckets, abandoning the call once the source's timeout elapses.
pub async fn fetch_bounded(adapter: &dyn KpSourceAdapter) -> IngestResult<Vec<NormalizedPoint>> {
    let descriptor = adapter.descriptor();
    match tokio::time::timeout(descriptor.fetch_timeout, adapter.fetch_buckets()).await {
        Ok(result) => result,
        Err(_) => Err(IngestError::Timeout {
            url: descriptor.label.to_string(),
            timeout: descriptor.fetch_timeout,
        }),
    }
}

impl From<Rejection> for IngestError {
    fn from(rejection: Rejection) -> Self {
        IngestError::ValidationRejected(rejection.to_string())
    }
}
