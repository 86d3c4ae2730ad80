//! Search engine adapters for search-bench
//!
//! This crate provides implementations of the `SearchEngine` trait for:
//!
//! - Meilisearch
//! - OpenSearch
//! - Quickwit
//!
//! Every adapter implements `SearchEngine<D>` for any document type, so one
//! adapter value serves any corpus. Use [`create_engine`] to build one from
//! an [`EngineConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod http;
pub mod meilisearch;
pub mod opensearch;
pub mod polling;
pub mod quickwit;
pub mod types;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

use search_bench_core::{Document, EngineError, SearchEngine};

pub use meilisearch::MeilisearchEngine;
pub use opensearch::OpenSearchEngine;
pub use polling::{poll_until_finished, poll_until_visible};
pub use quickwit::QuickwitEngine;
pub use types::{ConfigValidationError, Engine, EngineConfig};

/// Errors raised while building an adapter
#[derive(Debug, thiserror::Error)]
pub enum CreateEngineError {
    /// The configuration is invalid
    #[error("invalid {engine} configuration: {source}")]
    Config {
        /// Engine being configured
        engine: Engine,
        /// Validation failure
        #[source]
        source: ConfigValidationError,
    },

    /// The HTTP client could not be built
    #[error("cannot build {engine} client: {source}")]
    Client {
        /// Engine being configured
        engine: Engine,
        /// Underlying error
        #[source]
        source: EngineError,
    },
}

/// Build the adapter for `config.engine`
///
/// # Errors
///
/// Returns an error if the configuration does not validate or the HTTP
/// client cannot be built.
pub fn create_engine<D: Document>(
    config: EngineConfig,
) -> Result<Arc<dyn SearchEngine<D>>, CreateEngineError> {
    let engine = config.engine;
    config
        .validate()
        .map_err(|source| CreateEngineError::Config { engine, source })?;

    let client_error = |source| CreateEngineError::Client { engine, source };
    let adapter: Arc<dyn SearchEngine<D>> = match engine {
        Engine::Meilisearch => Arc::new(MeilisearchEngine::new(config).map_err(client_error)?),
        Engine::OpenSearch => Arc::new(OpenSearchEngine::new(config).map_err(client_error)?),
        Engine::Quickwit => Arc::new(QuickwitEngine::new(config).map_err(client_error)?),
    };

    tracing::debug!(engine = engine.id(), "Engine adapter created");
    Ok(adapter)
}
