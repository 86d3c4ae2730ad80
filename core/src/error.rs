//! Error types for search-bench-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::metrics::PercentileError;
use crate::orchestrator::Phase;
use crate::traits::{EngineError, GeneratorError, Query};

/// Core error type
///
/// Every variant except `Config` and `UnsupportedQuery` is raised after I/O has
/// started; those two are only produced while building a benchmark.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A configured query is not supported by a configured engine (strict mode)
    #[error("query {query} is not supported by \"{engine}\"")]
    UnsupportedQuery {
        /// Query kind that failed the check
        query: Query,
        /// Engine that does not declare it
        engine: String,
    },

    /// A setup phase failed on one engine; the whole run is aborted
    #[error("{engine}: {phase} failed: {source}")]
    Setup {
        /// Engine name
        engine: String,
        /// Phase that failed
        phase: Phase,
        /// Underlying engine error
        #[source]
        source: EngineError,
    },

    /// Document generation failed
    #[error("document generation failed: {0}")]
    Generator(#[from] GeneratorError),

    /// Query executor failure (worker task panicked or was cancelled)
    #[error("executor error: {0}")]
    Executor(String),

    /// Percentile computation failed
    #[error("metrics error: {0}")]
    Metrics(#[from] PercentileError),

    /// The benchmark was already run (or a run was attempted and left it in `phase`)
    #[error("benchmark cannot run again: it is in phase {phase}")]
    AlreadyRun {
        /// Phase the benchmark was left in
        phase: Phase,
    },

    /// The run was interrupted (Ctrl+C)
    #[error("benchmark interrupted")]
    Interrupted,
}

impl BenchError {
    /// Configuration error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::Config(msg.into())
    }

    /// A required builder field is missing
    pub fn missing_config(field: &str) -> Self {
        BenchError::Config(format!("missing required field: {}", field))
    }

    /// Fatal setup failure for one engine
    pub fn setup(engine: impl Into<String>, phase: Phase, source: EngineError) -> Self {
        BenchError::Setup {
            engine: engine.into(),
            phase,
            source,
        }
    }

    /// Executor failure
    pub fn executor(msg: impl Into<String>) -> Self {
        BenchError::Executor(msg.into())
    }

    /// Whether this error was raised before any engine was touched
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BenchError::Config(_) | BenchError::UnsupportedQuery { .. }
        )
    }
}

impl From<ConfigError> for BenchError {
    fn from(e: ConfigError) -> Self {
        BenchError::Config(e.to_string())
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
