//! Multi-source Kp ingestion with priority fallback, plus the summary and
//! GNSS risk read models built on top of the stored data.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod overrides;
pub mod resolution;
pub mod risk;
pub mod services;
pub mod summary;

pub use error::{IngestError, IngestResult};
