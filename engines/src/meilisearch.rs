//! Meilisearch adapter

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use search_bench_core::{Document, EngineError, Query, SearchEngine};
use serde::Deserialize;

use crate::http::{ndjson, Transport};
use crate::polling::{poll_until_finished, poll_until_visible};
use crate::types::{Engine, EngineConfig};

/// Meilisearch engine talking to `/indexes/{index}`
#[derive(Debug, Clone)]
pub struct MeilisearchEngine {
    config: EngineConfig,
    transport: Transport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    number_of_documents: usize,
}

/// Body of a `202 Accepted` answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueuedTask {
    task_uid: u64,
}

#[derive(Debug, Deserialize)]
struct Task {
    status: TaskStatus,
    #[serde(default)]
    error: Option<TaskError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum TaskStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Deserialize)]
struct TaskError {
    message: String,
    code: String,
}

impl MeilisearchEngine {
    /// Create an adapter for `config` (expected to be validated)
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    fn index_url(&self, suffix: &str) -> String {
        self.transport
            .url(&format!("/indexes/{}{}", self.config.index_name, suffix))
    }

    /// Wait for task `uid` to leave the queue
    ///
    /// A deletion that failed only because the index was missing counts as done.
    async fn wait_for_task(&self, uid: u64) -> Result<(), EngineError> {
        let task_id = uid.to_string();
        poll_until_finished(
            Engine::Meilisearch.id(),
            &task_id,
            self.config.poll_interval,
            self.config.index_timeout,
            || self.task_finished(uid),
        )
        .await
    }

    async fn task_finished(&self, uid: u64) -> Result<bool, EngineError> {
        let request = self
            .transport
            .client()
            .get(self.transport.url(&format!("/tasks/{}", uid)));
        let response = self.transport.send(request).await?;
        let task: Task = self.transport.json(response).await?;

        match task.status {
            TaskStatus::Enqueued | TaskStatus::Processing => Ok(false),
            TaskStatus::Succeeded => Ok(true),
            TaskStatus::Failed => match task.error {
                Some(error) if error.code == "index_not_found" => Ok(true),
                Some(error) => Err(self.rejected(format!(
                    "task {} failed: {} ({})",
                    uid, error.message, error.code
                ))),
                None => Err(self.rejected(format!("task {} failed", uid))),
            },
            TaskStatus::Canceled => Err(self.rejected(format!("task {} was canceled", uid))),
        }
    }

    fn rejected(&self, message: String) -> EngineError {
        EngineError::Rejected {
            engine: Engine::Meilisearch.id().to_string(),
            message,
        }
    }

    async fn document_count(&self) -> Result<usize, EngineError> {
        let request = self.transport.client().get(self.index_url("/stats"));
        match self.transport.send_allow_missing(request).await? {
            Some(response) => {
                let stats: IndexStats = self.transport.json(response).await?;
                Ok(stats.number_of_documents)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl<D: Document> SearchEngine<D> for MeilisearchEngine {
    fn name(&self) -> &str {
        Engine::Meilisearch.id()
    }

    fn supported_queries(&self) -> &[Query] {
        Engine::Meilisearch.supported_queries()
    }

    async fn clear(&self) -> Result<(), EngineError> {
        let request = self.transport.client().delete(self.index_url(""));
        let Some(response) = self.transport.send_allow_missing(request).await? else {
            tracing::debug!(
                engine = "meilisearch",
                index = %self.config.index_name,
                "Index does not exist"
            );
            return Ok(());
        };

        let task: EnqueuedTask = self.transport.json(response).await?;
        tracing::debug!(
            engine = "meilisearch",
            task = task.task_uid,
            "Waiting for index deletion"
        );
        self.wait_for_task(task.task_uid).await
    }

    async fn insert_batch(&self, docs: &[D]) -> Result<(), EngineError> {
        tracing::debug!(engine = "meilisearch", documents = docs.len(), "Inserting batch");
        let request = self
            .transport
            .client()
            .post(self.index_url("/documents"))
            .query(&[("primaryKey", "id")])
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(ndjson(docs)?);

        self.transport.send(request).await?;
        Ok(())
    }

    async fn wait_until_indexed(&self, expected: usize) -> Result<(), EngineError> {
        poll_until_visible(
            Engine::Meilisearch.id(),
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
            .get(self.index_url("/search"))
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

    fn engine(server: &FakeServer) -> Arc<dyn SearchEngine<TestDoc>> {
        let config = server.config(Engine::Meilisearch, "articles");
        Arc::new(MeilisearchEngine::new(config).unwrap())
    }

    /// Answers the DELETE with task 7, then serves `statuses` for `/tasks/7` in order
    async fn deletion_server(statuses: Vec<&'static str>) -> FakeServer {
        let polls = AtomicUsize::new(0);
        FakeServer::start(move |request| {
            if request.method == "DELETE" {
                return (202, r#"{"taskUid":7,"status":"enqueued","type":"indexDeletion"}"#.into());
            }
            let idx = polls.fetch_add(1, Ordering::SeqCst).min(statuses.len() - 1);
            (200, statuses[idx].to_string())
        })
        .await
    }

    fn fast_engine(server: &FakeServer) -> Arc<dyn SearchEngine<TestDoc>> {
        let config = server
            .config(Engine::Meilisearch, "articles")
            .with_poll_interval(Duration::from_millis(10));
        Arc::new(MeilisearchEngine::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_clear_waits_for_deletion_task() {
        let server = deletion_server(vec![
            r#"{"uid":7,"status":"enqueued"}"#,
            r#"{"uid":7,"status":"succeeded"}"#,
        ])
        .await;

        fast_engine(&server).clear().await.unwrap();

        let requests: Vec<(String, String)> = server
            .requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(
            requests,
            vec![
                ("DELETE".to_string(), "/indexes/articles".to_string()),
                ("GET".to_string(), "/tasks/7".to_string()),
                ("GET".to_string(), "/tasks/7".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_failed_task_is_rejected() {
        let server = deletion_server(vec![
            r#"{"uid":7,"status":"failed","error":{"message":"disk full","code":"internal"}}"#,
        ])
        .await;

        let err = fast_engine(&server).clear().await.unwrap_err();
        match err {
            EngineError::Rejected { engine, message } => {
                assert_eq!(engine, "meilisearch");
                assert!(message.contains("disk full"), "{}", message);
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clear_task_for_missing_index_is_ok() {
        let server = deletion_server(vec![
            r#"{"uid":7,"status":"failed","error":{"message":"Index `articles` not found.","code":"index_not_found"}}"#,
        ])
        .await;

        assert!(fast_engine(&server).clear().await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_missing_index_is_ok() {
        let server = FakeServer::start(|_| (404, r#"{"code":"index_not_found"}"#.into())).await;
        assert!(engine(&server).clear().await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_server_error() {
        let server = FakeServer::start(|_| (500, "boom".into())).await;
        let err = engine(&server).clear().await.unwrap_err();

        match err {
            EngineError::Status {
                engine,
                status,
                body,
            } => {
                assert_eq!(engine, "meilisearch");
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insert_sends_ndjson() {
        let server = FakeServer::start(|_| (202, r#"{"taskUid":2}"#.into())).await;
        let docs = vec![TestDoc::new(1, "first"), TestDoc::new(2, "second")];

        engine(&server).insert_batch(&docs).await.unwrap();

        let request = &server.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/indexes/articles/documents?primaryKey=id");
        assert_eq!(
            request.content_type.as_deref(),
            Some("application/x-ndjson")
        );
        assert_eq!(
            request.body,
            "{\"id\":1,\"title\":\"first\"}\n{\"id\":2,\"title\":\"second\"}"
        );
    }

    #[tokio::test]
    async fn test_wait_polls_stats() {
        let polls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&polls);
        let server = FakeServer::start(move |_| {
            let count = if seen.fetch_add(1, Ordering::SeqCst) == 0 { 0 } else { 3 };
            (200, format!(r#"{{"numberOfDocuments":{},"isIndexing":false}}"#, count))
        })
        .await;

        engine(&server).wait_until_indexed(3).await.unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert!(server
            .requests()
            .iter()
            .all(|r| r.method == "GET" && r.path == "/indexes/articles/stats"));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let server = FakeServer::start(|_| (404, "{}".into())).await;
        let config = server
            .config(Engine::Meilisearch, "articles")
            .with_index_timeout(Some(Duration::from_secs(1)));
        let engine: Arc<dyn SearchEngine<TestDoc>> =
            Arc::new(MeilisearchEngine::new(config).unwrap());

        let err = engine.wait_until_indexed(1).await.unwrap_err();
        assert!(matches!(err, EngineError::IndexTimeout { visible: 0, .. }));
    }

    #[tokio::test]
    async fn test_execute_encodes_query() {
        let server = FakeServer::start(|_| (200, r#"{"hits":[]}"#.into())).await;
        let engine = engine(&server);

        engine.execute(Query::SingleWord).await.unwrap();
        engine.execute(Query::PhraseMatch).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].path, "/indexes/articles/search?q=music");
        assert_eq!(
            requests[1].path,
            "/indexes/articles/search?q=%22popular+music%22"
        );
    }

    #[tokio::test]
    async fn test_execute_failure_status() {
        let server = FakeServer::start(|_| (503, "overloaded".into())).await;
        let err = engine(&server).execute(Query::SingleWord).await.unwrap_err();
        assert!(matches!(err, EngineError::Status { status: 503, .. }));
    }
}
