//! Shared HTTP plumbing for the engine adapters.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use search_bench_core::EngineError;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{Engine, EngineConfig};

/// HTTP client bound to one engine instance.
///
/// Wraps a pooled `reqwest::Client` built from the engine's timeouts and
/// turns non-success statuses into [`EngineError::Status`].
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    engine: Engine,
    client: Client,
    base_url: String,
}

impl Transport {
    /// Build the client for `config`.
    pub(crate) fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(32)
            .user_agent(format!("search-bench/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            engine: config.engine,
            client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Send and require a success status.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, EngineError> {
        let response = request.send().await?;
        self.check(response).await
    }

    /// Send, mapping 404 to `None`.
    pub(crate) async fn send_allow_missing(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<Response>, EngineError> {
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check(response).await.map(Some)
    }

    /// Decode a JSON response body.
    pub(crate) async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T, EngineError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::Decode(format!("{}: {}", self.engine.id(), e)))
    }

    async fn check(&self, response: Response) -> Result<Response, EngineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(
            engine = self.engine.id(),
            status = status.as_u16(),
            body = %body,
            "Non-success status"
        );
        Err(EngineError::Status {
            engine: self.engine.id().to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Newline-delimited JSON, one document per line.
pub(crate) fn ndjson<D: Serialize>(docs: &[D]) -> Result<String, EngineError> {
    let mut body = String::new();
    for doc in docs {
        let line = serde_json::to_string(doc).map_err(|e| EngineError::Encode(e.to_string()))?;
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&line);
    }
    Ok(body)
}
