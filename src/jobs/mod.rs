//! Ingestion cycle and its job queue plumbing

pub mod context;
pub mod cycle;
pub mod handlers;
pub mod types;

pub use context::JobContext;
pub use cycle::{AttemptSummary, CycleReport, IngestCycle, KpTaskReport, TaskOutcome};
pub use types::IngestCycleJob;
