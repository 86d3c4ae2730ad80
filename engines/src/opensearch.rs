//! OpenSearch adapter

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use search_bench_core::{Document, EngineError, Query, SearchEngine};
use serde::Deserialize;
use serde_json::json;

use crate::http::Transport;
use crate::polling::poll_until_visible;
use crate::types::{Engine, EngineConfig};

/// OpenSearch engine using the `_bulk`, `_stats` and `_search` APIs
#[derive(Debug, Clone)]
pub struct OpenSearchEngine {
    config: EngineConfig,
    transport: Transport,
}

#[derive(Debug, Deserialize)]
struct IndexStatsResponse {
    #[serde(default)]
    indices: HashMap<String, IndexStats>,
}

#[derive(Debug, Deserialize)]
struct IndexStats {
    /// Primary shards only; `total` also counts replica copies
    primaries: StatsTotals,
}

#[derive(Debug, Deserialize)]
struct StatsTotals {
    docs: DocCounts,
}

#[derive(Debug, Deserialize)]
struct DocCounts {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl OpenSearchEngine {
    /// Create an adapter for `config` (expected to be validated)
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    fn index_url(&self, suffix: &str) -> String {
        self.transport
            .url(&format!("/{}{}", self.config.index_name, suffix))
    }

    /// Body for `POST /_bulk`: a `create` action line before every document
    fn bulk_body<D: Document>(&self, docs: &[D]) -> Result<String, EngineError> {
        let mut body = String::new();
        for doc in docs {
            let action = json!({ "create": { "_index": self.config.index_name, "_id": doc.id() } });
            body.push_str(&action.to_string());
            body.push('\n');
            let source =
                serde_json::to_string(doc).map_err(|e| EngineError::Encode(e.to_string()))?;
            body.push_str(&source);
            body.push('\n');
        }
        Ok(body)
    }

    async fn document_count(&self) -> Result<usize, EngineError> {
        let request = self.transport.client().get(self.index_url("/_stats"));
        let Some(response) = self.transport.send_allow_missing(request).await? else {
            return Ok(0);
        };

        let stats: IndexStatsResponse = self.transport.json(response).await?;
        Ok(stats
            .indices
            .get(&self.config.index_name)
            .map(|index| index.primaries.docs.count)
            .unwrap_or(0))
    }
}

#[async_trait]
impl<D: Document> SearchEngine<D> for OpenSearchEngine {
    fn name(&self) -> &str {
        Engine::OpenSearch.id()
    }

    fn supported_queries(&self) -> &[Query] {
        Engine::OpenSearch.supported_queries()
    }

    async fn clear(&self) -> Result<(), EngineError> {
        tracing::info!(engine = "opensearch", index = %self.config.index_name, "Clearing existing documents");
        let request = self.transport.client().delete(self.index_url(""));
        if self.transport.send_allow_missing(request).await?.is_none() {
            tracing::debug!(engine = "opensearch", "Index does not exist");
        }
        Ok(())
    }

    async fn insert_batch(&self, docs: &[D]) -> Result<(), EngineError> {
        tracing::debug!(engine = "opensearch", documents = docs.len(), "Inserting batch");
        let request = self
            .transport
            .client()
            .post(self.transport.url("/_bulk"))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(self.bulk_body(docs)?);

        let response = self.transport.send(request).await?;
        let bulk: BulkResponse = self.transport.json(response).await?;
        if !bulk.errors {
            return Ok(());
        }

        let failed: Vec<&serde_json::Value> = bulk
            .items
            .iter()
            .flat_map(|item| item.values())
            .filter_map(|item| item.error.as_ref())
            .collect();
        let first = failed
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());

        Err(EngineError::Rejected {
            engine: Engine::OpenSearch.id().to_string(),
            message: format!("{} of {} documents failed, first: {}", failed.len(), docs.len(), first),
        })
    }

    async fn wait_until_indexed(&self, expected: usize) -> Result<(), EngineError> {
        poll_until_visible(
            Engine::OpenSearch.id(),
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
            .get(self.index_url("/_search"))
            .query(&[("q", query.search_text())]);

        self.transport.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeServer, TestDoc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn adapter(server: &FakeServer) -> OpenSearchEngine {
        OpenSearchEngine::new(server.config(Engine::OpenSearch, "articles")).unwrap()
    }

    fn engine(server: &FakeServer) -> Arc<dyn SearchEngine<TestDoc>> {
        Arc::new(adapter(server))
    }

    #[tokio::test]
    async fn test_bulk_body_format() {
        let server = FakeServer::start(|_| (200, "{}".into())).await;
        let body = adapter(&server)
            .bulk_body(&[TestDoc::new(7, "seven"), TestDoc::new(8, "eight")])
            .unwrap();

        let lines: Vec<serde_json::Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["create"]["_index"], "articles");
        assert_eq!(lines[0]["create"]["_id"], 7);
        assert_eq!(lines[1]["title"], "seven");
        assert_eq!(lines[2]["create"]["_id"], 8);
        assert!(body.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_insert_posts_bulk() {
        let server = FakeServer::start(|_| (200, r#"{"took":3,"errors":false,"items":[]}"#.into())).await;

        engine(&server)
            .insert_batch(&[TestDoc::new(1, "one")])
            .await
            .unwrap();

        let request = &server.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/_bulk");
        assert!(request.body.starts_with(r#"{"create":"#));
    }

    #[tokio::test]
    async fn test_bulk_item_errors_are_rejected() {
        let response = json!({
            "errors": true,
            "items": [
                { "create": { "status": 201 } },
                { "create": { "status": 400, "error": { "type": "mapper_parsing_exception" } } }
            ]
        })
        .to_string();
        let server = FakeServer::start(move |_| (200, response.clone())).await;

        let err = engine(&server)
            .insert_batch(&[TestDoc::new(1, "a"), TestDoc::new(2, "b")])
            .await
            .unwrap_err();

        match err {
            EngineError::Rejected { engine, message } => {
                assert_eq!(engine, "opensearch");
                assert!(message.starts_with("1 of 2 documents failed"));
                assert!(message.contains("mapper_parsing_exception"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_document_count_from_stats() {
        let server = FakeServer::start(|_| {
            (
                200,
                r#"{"indices":{"articles":{"primaries":{"docs":{"count":42,"deleted":0}},"total":{"docs":{"count":42,"deleted":0}}}}}"#.into(),
            )
        })
        .await;

        assert_eq!(adapter(&server).document_count().await.unwrap(), 42);
        assert_eq!(server.requests()[0].path, "/articles/_stats");
    }

    #[tokio::test]
    async fn test_replica_copies_do_not_count_as_indexed() {
        let polls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&polls);
        let server = FakeServer::start(move |_| {
            let primaries = if seen.fetch_add(1, Ordering::SeqCst) == 0 { 50 } else { 100 };
            let body = json!({
                "indices": {
                    "articles": {
                        "primaries": { "docs": { "count": primaries } },
                        "total": { "docs": { "count": primaries * 2 } }
                    }
                }
            });
            (200, body.to_string())
        })
        .await;
        let config = server
            .config(Engine::OpenSearch, "articles")
            .with_poll_interval(Duration::from_millis(10));
        let engine: Arc<dyn SearchEngine<TestDoc>> =
            Arc::new(OpenSearchEngine::new(config).unwrap());

        engine.wait_until_indexed(100).await.unwrap();
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_document_count_missing_index() {
        let server = FakeServer::start(|_| (404, r#"{"error":"index_not_found_exception"}"#.into())).await;
        assert_eq!(adapter(&server).document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_deletes_index_and_tolerates_missing() {
        let server = FakeServer::start(|_| (404, "{}".into())).await;
        engine(&server).clear().await.unwrap();

        let request = &server.requests()[0];
        assert_eq!(request.method, "DELETE");
        assert_eq!(request.path, "/articles");
    }

    #[tokio::test]
    async fn test_execute_searches_index() {
        let server = FakeServer::start(|_| (200, r#"{"hits":{"hits":[]}}"#.into())).await;
        engine(&server).execute(Query::PhraseMatch).await.unwrap();

        assert_eq!(
            server.requests()[0].path,
            "/articles/_search?q=%22popular+music%22"
        );
    }
}
