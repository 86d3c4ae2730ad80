//! Engine types and configuration
//!
//! This module provides the engine enumeration and the configuration every
//! adapter is built from.

use std::time::Duration;

use search_bench_core::Query;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A required configuration field is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The engine address is not an http(s) URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A timeout value is out of acceptable range.
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(Duration),

    /// The polling interval is below the minimum.
    #[error("invalid poll interval: {0:?} (minimum is 1s)")]
    InvalidPollInterval(Duration),
}

// ============================================================================
// Engine Enumeration
// ============================================================================

/// Enumeration of supported search engines.
///
/// Used for configuration parsing and adapter factory dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Meilisearch
    Meilisearch,
    /// OpenSearch (Elasticsearch-compatible)
    OpenSearch,
    /// Quickwit
    Quickwit,
}

impl Engine {
    /// Returns the display name for this engine.
    pub fn display_name(&self) -> &'static str {
        match self {
            Engine::Meilisearch => "Meilisearch",
            Engine::OpenSearch => "OpenSearch",
            Engine::Quickwit => "Quickwit",
        }
    }

    /// Returns the identifier used in logs and reports.
    pub fn id(&self) -> &'static str {
        match self {
            Engine::Meilisearch => "meilisearch",
            Engine::OpenSearch => "opensearch",
            Engine::Quickwit => "quickwit",
        }
    }

    /// Returns the address of a locally running instance with default settings.
    pub fn default_address(&self) -> &'static str {
        match self {
            Engine::Meilisearch => "http://localhost:7700",
            Engine::OpenSearch => "http://localhost:9200",
            Engine::Quickwit => "http://localhost:7280",
        }
    }

    /// Returns the query kinds this engine's adapter can run.
    pub fn supported_queries(&self) -> &'static [Query] {
        match self {
            Engine::Meilisearch | Engine::OpenSearch => &[Query::SingleWord, Query::PhraseMatch],
            Engine::Quickwit => &[Query::SingleWord],
        }
    }

    /// Returns all supported engines.
    pub fn all() -> &'static [Engine] {
        &[Engine::Meilisearch, Engine::OpenSearch, Engine::Quickwit]
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meilisearch" | "meili" => Ok(Engine::Meilisearch),
            "opensearch" => Ok(Engine::OpenSearch),
            "quickwit" => Ok(Engine::Quickwit),
            _ => Err(format!("Unknown engine: {}", s)),
        }
    }
}

// ============================================================================
// Engine Configuration
// ============================================================================

/// Configuration for creating an engine adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target engine
    pub engine: Engine,

    /// Base URL, e.g. `http://localhost:7700`
    pub address: String,

    /// Index holding the benchmark corpus
    pub index_name: String,

    /// Request timeout
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Delay between two document-count polls
    #[serde(default = "default_poll_interval")]
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Give up waiting for indexing after this long; `None` waits forever
    #[serde(default = "default_index_timeout")]
    #[serde(with = "humantime_serde")]
    pub index_timeout: Option<Duration>,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_index_timeout() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

impl EngineConfig {
    /// Create a new engine config with required fields.
    pub fn new(engine: Engine, address: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            engine,
            address: address.into(),
            index_name: index_name.into(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            poll_interval: default_poll_interval(),
            index_timeout: default_index_timeout(),
        }
    }

    /// Create a config pointing at the engine's default local address.
    pub fn local(engine: Engine, index_name: impl Into<String>) -> Self {
        Self::new(engine, engine.default_address(), index_name)
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the indexing timeout.
    pub fn with_index_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.index_timeout = timeout;
        self
    }

    /// Address without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.address.trim_end_matches('/')
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.address.is_empty() {
            return Err(ConfigValidationError::MissingField("address"));
        }
        if !(self.address.starts_with("http://") || self.address.starts_with("https://")) {
            return Err(ConfigValidationError::InvalidAddress(self.address.clone()));
        }
        if self.index_name.is_empty() {
            return Err(ConfigValidationError::MissingField("index_name"));
        }

        // 1s to 1h for request, 1s to 5m for connect
        if self.request_timeout < Duration::from_secs(1)
            || self.request_timeout > Duration::from_secs(3600)
        {
            return Err(ConfigValidationError::InvalidTimeout(self.request_timeout));
        }
        if self.connect_timeout < Duration::from_secs(1)
            || self.connect_timeout > Duration::from_secs(300)
        {
            return Err(ConfigValidationError::InvalidTimeout(self.connect_timeout));
        }

        if self.poll_interval < Duration::from_secs(1) {
            return Err(ConfigValidationError::InvalidPollInterval(self.poll_interval));
        }
        if let Some(timeout) = self.index_timeout {
            if timeout < self.poll_interval {
                return Err(ConfigValidationError::InvalidTimeout(timeout));
            }
        }

        Ok(())
    }
}
