//! Benchmark configuration types

use serde::{Deserialize, Serialize};

/// Default number of documents per ingestion round
pub const DEFAULT_INGEST_CHUNK_SIZE: usize = 1000;

/// Benchmark configuration
///
/// Defines how a benchmark run ingests documents and how hard the query
/// phase drives each engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of concurrent query workers per (engine, query)
    pub concurrency: usize,

    /// Total number of query calls per (engine, query)
    pub repeats: usize,

    /// Documents sent per insert batch
    pub ingest_chunk_size: usize,

    /// Documents to generate; `None` lets the generator decide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<usize>,

    /// Skip unsupported (engine, query) pairs instead of failing at build time
    #[serde(default)]
    pub ignore_unsupported_queries: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            repeats: 10,
            ingest_chunk_size: DEFAULT_INGEST_CHUNK_SIZE,
            document_count: None,
            ignore_unsupported_queries: false,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new config with the given query load
    pub fn new(concurrency: usize, repeats: usize) -> Self {
        Self {
            concurrency,
            repeats,
            ..Default::default()
        }
    }

    /// Set the ingestion chunk size
    pub fn with_ingest_chunk_size(mut self, size: usize) -> Self {
        self.ingest_chunk_size = size;
        self
    }

    /// Set the target document count
    pub fn with_document_count(mut self, count: Option<usize>) -> Self {
        self.document_count = count;
        self
    }

    /// Skip unsupported queries instead of failing
    pub fn with_ignore_unsupported_queries(mut self, ignore: bool) -> Self {
        self.ignore_unsupported_queries = ignore;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.repeats == 0 {
            return Err(ConfigError::InvalidRepeats(
                "repeats must be at least 1".into(),
            ));
        }

        if self.ingest_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(
                "ingest chunk size must be at least 1".into(),
            ));
        }

        if self.document_count == Some(0) {
            return Err(ConfigError::InvalidDocumentCount(
                "document count must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid repeat count
    #[error("Invalid repeats: {0}")]
    InvalidRepeats(String),

    /// Invalid ingestion chunk size
    #[error("Invalid ingest chunk size: {0}")]
    InvalidChunkSize(String),

    /// Invalid document count
    #[error("Invalid document count: {0}")]
    InvalidDocumentCount(String),
}
