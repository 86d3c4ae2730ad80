//! Quickwit adapter

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use search_bench_core::{Document, EngineError, Query, SearchEngine};
use serde::Deserialize;

use crate::http::{ndjson, Transport};
use crate::polling::poll_until_visible;
use crate::types::{Engine, EngineConfig};

/// Quickwit engine using the `/api/v1` REST API
///
/// The index must already exist with a doc mapping that fits the corpus;
/// clearing only drops its splits.
#[derive(Debug, Clone)]
pub struct QuickwitEngine {
    config: EngineConfig,
    transport: Transport,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    num_hits: usize,
}

impl QuickwitEngine {
    /// Create an adapter for `config` (expected to be validated)
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    fn api_url(&self, path: &str) -> String {
        self.transport.url(&format!("/api/v1{}", path))
    }

    async fn document_count(&self) -> Result<usize, EngineError> {
        let request = self
            .transport
            .client()
            .get(self.api_url(&format!("/{}/search", self.config.index_name)))
            .query(&[("query", "*"), ("max_hits", "0")]);

        match self.transport.send_allow_missing(request).await? {
            Some(response) => {
                let result: SearchResponse = self.transport.json(response).await?;
                Ok(result.num_hits)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl<D: Document> SearchEngine<D> for QuickwitEngine {
    fn name(&self) -> &str {
        Engine::Quickwit.id()
    }

    fn supported_queries(&self) -> &[Query] {
        Engine::Quickwit.supported_queries()
    }

    async fn clear(&self) -> Result<(), EngineError> {
        let request = self
            .transport
            .client()
            .put(self.api_url(&format!("/indexes/{}/clear", self.config.index_name)));
        if self.transport.send_allow_missing(request).await?.is_none() {
            tracing::debug!(engine = "quickwit", index = %self.config.index_name, "Index does not exist");
        }
        Ok(())
    }

    async fn insert_batch(&self, docs: &[D]) -> Result<(), EngineError> {
        tracing::debug!(engine = "quickwit", documents = docs.len(), "Inserting batch");
        let request = self
            .transport
            .client()
            .post(self.api_url(&format!("/{}/ingest", self.config.index_name)))
            .header(CONTENT_TYPE, "application/json")
            .body(ndjson(docs)?);

        self.transport.send(request).await?;
        Ok(())
    }

    async fn wait_until_indexed(&self, expected: usize) -> Result<(), EngineError> {
        poll_until_visible(
            Engine::Quickwit.id(),
            expected,
            self.config.poll_interval,
            self.config.index_timeout,
            || self.document_count(),
        )
        .await
    }

    async fn execute(&self, query: Query) -> Result<(), EngineError> {
        if !<Self as SearchEngine<D>>::supports(self, query) {
            return Err(EngineError::UnsupportedQuery(query));
        }

        let request = self
            .transport
            .client()
            .get(self.api_url(&format!("/{}/search", self.config.index_name)))
            .query(&[("query", query.search_text())]);

        self.transport.send(request).await?;
        Ok(())
    }
}
