//! Core traits for search engines and document generators
//!
//! These traits are defined in core so the orchestrator never depends on a
//! concrete engine or corpus. Implementations live in their respective crates
//! (engines/, generators/).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Query
// ============================================================================

/// Kind of search operation a benchmark exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Single-term lookup
    SingleWord,
    /// Exact phrase lookup
    PhraseMatch,
}

impl Query {
    /// All query kinds, in reporting order
    pub fn all() -> &'static [Query] {
        &[Query::SingleWord, Query::PhraseMatch]
    }

    /// Search text sent to the engine for this query kind
    pub fn search_text(&self) -> &'static str {
        match self {
            Query::SingleWord => "music",
            Query::PhraseMatch => "\"popular music\"",
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::SingleWord => write!(f, "single_word"),
            Query::PhraseMatch => write!(f, "phrase_match"),
        }
    }
}

impl std::str::FromStr for Query {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_word" | "single-word" => Ok(Query::SingleWord),
            "phrase_match" | "phrase-match" | "phrase" => Ok(Query::PhraseMatch),
            _ => Err(format!("Unknown query: {}", s)),
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// A document that can be ingested by every engine
///
/// Documents are serialized as JSON on the wire; `id` is the primary key.
pub trait Document: Serialize + Clone + Send + Sync + 'static {
    /// Stable unique identifier
    fn id(&self) -> u64;
}

// ============================================================================
// Search Engine Trait
// ============================================================================

/// Capability contract every search backend implements
///
/// The orchestrator and the query executor only ever hold
/// `Arc<dyn SearchEngine<D>>`; wire protocols stay inside the adapters.
#[async_trait]
pub trait SearchEngine<D: Document>: Send + Sync {
    /// Engine identifier used in all reporting (e.g. "opensearch")
    fn name(&self) -> &str;

    /// Query kinds this engine can execute. Stable for the handle's lifetime.
    fn supported_queries(&self) -> &[Query];

    /// Remove all existing documents. A missing index counts as success.
    async fn clear(&self) -> Result<(), EngineError>;

    /// Send one batch of documents. No retry on failure.
    async fn insert_batch(&self, docs: &[D]) -> Result<(), EngineError>;

    /// Poll until at least `expected` documents are visible to search
    async fn wait_until_indexed(&self, expected: usize) -> Result<(), EngineError>;

    /// Issue exactly one query; the result payload is discarded
    async fn execute(&self, query: Query) -> Result<(), EngineError>;

    /// Whether `query` is declared in `supported_queries`
    fn supports(&self, query: Query) -> bool {
        self.supported_queries().contains(&query)
    }
}

/// Engine-specific errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// HTTP/network error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Engine answered with a non-success status
    #[error("{engine} returned status {status}: {body}")]
    Status {
        /// Engine name
        engine: String,
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// Target index does not exist
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Documents did not become visible in time
    #[error("indexing timed out after {waited:?}: {visible}/{expected} documents visible")]
    IndexTimeout {
        /// Documents expected
        expected: usize,
        /// Documents visible at the last poll
        visible: usize,
        /// Time spent polling
        waited: Duration,
    },

    /// An asynchronous engine task did not finish in time
    #[error("task {task} did not finish within {waited:?}")]
    TaskTimeout {
        /// Engine-side task identifier
        task: String,
        /// Time spent polling
        waited: Duration,
    },

    /// Engine accepted the request but refused some of its content
    #[error("{engine} rejected the request: {message}")]
    Rejected {
        /// Engine name
        engine: String,
        /// Engine-provided reason
        message: String,
    },

    /// Documents could not be serialized
    #[error("encode error: {0}")]
    Encode(String),

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Query kind not supported by this engine
    #[error("unsupported query: {0}")]
    UnsupportedQuery(Query),
}

impl EngineError {
    /// Whether the error only says the index does not exist yet
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::IndexNotFound(_) => true,
            EngineError::Status { status, .. } => *status == 404,
            _ => false,
        }
    }
}

// ============================================================================
// Document Generator Trait
// ============================================================================

/// Produces the corpus a benchmark ingests
///
/// Implementations can synthesize documents or parse them from a dump.
pub trait DocumentGenerator<D: Document>: Send + Sync {
    /// Generator name for identification
    fn name(&self) -> &str;

    /// Produce documents
    ///
    /// `None` lets the generator pick its own default amount.
    fn generate(&mut self, count: Option<usize>) -> Result<Vec<D>, GeneratorError>;
}

/// Generator-specific errors
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Invalid generator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Corpus could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error (e.g., reading a dump file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
