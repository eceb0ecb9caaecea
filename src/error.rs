use std::time::Duration;
use thiserror::Error;

/// Error taxonomy for ingestion, validation and storage.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Network error from {url}: {message}")]
    Network { url: String, message: String },

    #[error("Timed out after {}s fetching {url}", timeout.as_secs())]
    Timeout { url: String, timeout: Duration },

    #[error("{url} returned status {status_code}")]
    Status { url: String, status_code: u16 },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Validation rejected: {0}")]
    ValidationRejected(String),

    #[error("Every Kp source was exhausted")]
    SelectionExhausted,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        IngestError::Parse {
            message: message.into(),
        }
    }

    pub fn persistence<E: std::fmt::Display>(context: &str, err: E) -> Self {
        IngestError::Persistence(format!("{}: {}", context, err))
    }

    /// Short machine-friendly label, used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Network { .. } => "network",
            IngestError::Timeout { .. } => "timeout",
            IngestError::Status { .. } => "status",
            IngestError::Parse { .. } => "parse",
            IngestError::ValidationRejected(_) => "rejected",
            IngestError::SelectionExhausted => "exhausted",
            IngestError::Persistence(_) => "persistence",
            IngestError::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::parse_error(err.to_string())
    }
}

impl From<tokio_postgres::Error> for IngestError {
    fn from(err: tokio_postgres::Error) -> Self {
        IngestError::Persistence(err.to_string())
    }
}

impl From<redis::RedisError> for IngestError {
    fn from(err: redis::RedisError) -> Self {
        IngestError::Persistence(err.to_string())
    }
}
