//! Shared data models spanning the ingestion and read layers.

pub mod conditions;
pub mod point;
pub mod risk;
pub mod source;
pub mod summary;

pub use conditions::{ForecastEntry, ForecastKind, HistoryPoint, ScaleReading, SolarWindSample};
pub use point::{KpObservation, KpSelection, NormalizedPoint, RawSample, ResolvedSeries};
pub use risk::{RiskAssessment, RiskFactor, RiskLevel};
pub use source::{SourceDescriptor, SourceId, SourceOverride};
pub use summary::{KpStatus, Summary, Trend};
