//! JSON-over-HTTP fetching with per-call timeouts.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{IngestError, IngestResult};

const USER_AGENT: &str = concat!("kpwatch/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over `reqwest::Client` that fails closed: any transport
/// error, timeout, non-2xx status or undecodable body is an error.
#[derive(Clone, Default)]
pub struct JsonFetcher {
    client: reqwest::Client,
}

impl JsonFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, timeout: Duration) -> IngestResult<T> {
        self.execute(self.client.get(url), url, timeout).await
    }

    pub async fn post_json<B, T>(&self, url: &str, body: &B, timeout: Duration) -> IngestResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.client.post(url).json(body), url, timeout).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> IngestResult<T> {
        debug!(url = %url, timeout_secs = timeout.as_secs(), "fetching");

        let response = request.timeout(timeout).send().await.map_err(|e| transport_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| transport_error(url, timeout, e))?;
        serde_json::from_str(&body)
            .map_err(|e| IngestError::parse_error(format!("{} returned malformed JSON: {}", url, e)))
    }
}

fn transport_error(url: &str, timeout: Duration, err: reqwest::Error) -> IngestError {
    if err.is_timeout() {
        IngestError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        IngestError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
