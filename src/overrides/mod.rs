//! Operator override of Kp source selection.
//!
//! The override is read once at the start of every cycle and written by an
//! administrative action. Clearing it means writing `auto`.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::models::SourceOverride;

pub const OVERRIDE_KEY: &str = "kp:source-override";

#[async_trait]
pub trait OverrideStore: Send + Sync {
    async fn get_override(&self) -> IngestResult<SourceOverride>;

    async fn set_override(&self, value: SourceOverride) -> IngestResult<()>;

    /// Parse and store an operator-supplied value. Unknown values are
    /// rejected with the list of accepted ones.
    async fn set_override_str(&self, raw: &str) -> IngestResult<SourceOverride> {
        let value: SourceOverride = raw.parse()?;
        self.set_override(value).await?;
        Ok(value)
    }
}

pub struct RedisOverrideStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisOverrideStore {
    pub async fn connect(redis_url: &str) -> IngestResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| IngestError::Config(format!("invalid Redis URL: {}", e)))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            key: OVERRIDE_KEY.to_string(),
        }
    }
}

#[async_trait]
impl OverrideStore for RedisOverrideStore {
    async fn get_override(&self) -> IngestResult<SourceOverride> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&self.key).await?;
        match raw {
            None => Ok(SourceOverride::Auto),
            Some(raw) => match raw.parse() {
                Ok(value) => Ok(value),
                Err(e) => {
                    // A bad stored value must not block ingestion.
                    warn!(stored = %raw, error = %e, "Ignoring invalid stored Kp source override");
                    Ok(SourceOverride::Auto)
                }
            },
        }
    }

    async fn set_override(&self, value: SourceOverride) -> IngestResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&self.key, value.as_str()).await?;
        info!(source_override = %value, "Kp source override updated");
        Ok(())
    }
}

/// Process-local override, for tests and single-process setups.
#[derive(Default)]
pub struct MemoryOverrideStore {
    value: RwLock<SourceOverride>,
}

impl MemoryOverrideStore {
    pub fn new(initial: SourceOverride) -> Self {
        Self {
            value: RwLock::new(initial),
        }
    }
}

#[async_trait]
impl OverrideStore for MemoryOverrideStore {
    async fn get_override(&self) -> IngestResult<SourceOverride> {
        Ok(*self.value.read().await)
    }

    async fn set_override(&self, value: SourceOverride) -> IngestResult<()> {
        *self.value.write().await = value;
        Ok(())
    }
}
