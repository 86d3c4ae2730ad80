//! Benchmark execution logic

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::config::BenchmarkConfig;
use crate::error::{BenchError, BenchResult};
use crate::executor::{ExecutorConfig, QueryExecutor};
use crate::metrics::{duration_ms, PercentileError, QueryReport, RunSummary};
use crate::traits::{Document, DocumentGenerator, Query, SearchEngine};

use super::phase::Phase;

/// Split `items` into consecutive chunks of at most `chunk_size`
///
/// Yields `ceil(len / chunk_size)` chunks; only the last one may be short.
///
/// # Panics
///
/// Panics if `chunk_size` is 0, like [`slice::chunks`].
pub fn make_chunks<T>(items: &[T], chunk_size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(chunk_size)
}

/// Benchmark drives every engine through the lifecycle phases
///
/// Built by [`BenchmarkBuilder`](super::BenchmarkBuilder); runs at most once.
pub struct Benchmark<D: Document> {
    /// Benchmark configuration
    pub(crate) config: BenchmarkConfig,

    /// Engines under test, in configuration order
    pub(crate) engines: Vec<Arc<dyn SearchEngine<D>>>,

    /// Query kinds, in execution order
    pub(crate) queries: Vec<Query>,

    /// Corpus source, consumed once per run
    pub(crate) generator: Box<dyn DocumentGenerator<D>>,

    /// Current lifecycle phase
    pub(crate) phase: Phase,
}

impl<D: Document> Benchmark<D> {
    /// Create a new benchmark
    ///
    /// Use `BenchmarkBuilder`, which validates the configuration first.
    pub(crate) fn new(
        config: BenchmarkConfig,
        engines: Vec<Arc<dyn SearchEngine<D>>>,
        queries: Vec<Query>,
        generator: Box<dyn DocumentGenerator<D>>,
    ) -> Self {
        Self {
            config,
            engines,
            queries,
            generator,
            phase: Phase::Validated,
        }
    }

    /// Get the benchmark configuration
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Names of the engines under test
    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Run the benchmark
    ///
    /// Clears, fills and syncs every engine, then runs the query load. Any
    /// failure before the query phase aborts the run and leaves the
    /// benchmark in [`Phase::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::AlreadyRun`] unless the benchmark is freshly
    /// built.
    pub async fn run(&mut self) -> BenchResult<RunSummary> {
        if !self.phase.can_run() {
            return Err(BenchError::AlreadyRun { phase: self.phase });
        }

        let start = Instant::now();
        tracing::info!(
            engines = ?self.engine_names(),
            queries = ?self.queries,
            generator = self.generator.name(),
            concurrency = self.config.concurrency,
            repeats = self.config.repeats,
            "Starting benchmark"
        );

        match self.run_phases().await {
            Ok(summary) => {
                self.phase = Phase::Done;
                tracing::info!(
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    reports = summary.reports.len(),
                    "Benchmark completed"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(last_phase = %self.phase, error = %e, "Benchmark aborted");
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    /// Run with Ctrl+C signal handling
    ///
    /// An interrupt drops the in-flight phase and returns
    /// [`BenchError::Interrupted`].
    pub async fn run_with_signal_handling(&mut self) -> BenchResult<RunSummary> {
        let interrupt = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, stopping benchmark..."),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            }
        };

        let outcome = tokio::select! {
            result = self.run() => Some(result),
            _ = interrupt => None,
        };

        match outcome {
            Some(result) => result,
            None => {
                self.phase = Phase::Failed;
                Err(BenchError::Interrupted)
            }
        }
    }

    async fn run_phases(&mut self) -> BenchResult<RunSummary> {
        self.clear_engines().await?;
        self.phase = Phase::Cleared;

        let docs = self.generator.generate(self.config.document_count)?;
        tracing::info!(documents = docs.len(), "Generated documents");
        self.phase = Phase::Generated;

        let ingest_failures = self.ingest(&docs).await;
        self.phase = Phase::Ingested;

        self.wait_until_indexed(docs.len()).await?;
        self.phase = Phase::IndexSynced;

        let mut summary = RunSummary {
            document_count: docs.len(),
            ingest_failures,
            ..Default::default()
        };
        drop(docs);

        self.phase = Phase::Querying;
        let executor = QueryExecutor::new(ExecutorConfig::new(
            self.config.concurrency,
            self.config.repeats,
        ));
        for query in &self.queries {
            self.run_query(&executor, *query, &mut summary).await?;
        }

        Ok(summary)
    }

    /// Clear every engine concurrently; all must settle before checking
    async fn clear_engines(&self) -> BenchResult<()> {
        tracing::info!("Clearing engines");
        let results = join_all(
            self.engines
                .iter()
                .map(|engine| async move { (engine.name(), engine.clear().await) }),
        )
        .await;

        let mut first_error = None;
        for (name, result) in results {
            match result {
                Ok(()) => tracing::debug!(engine = name, "Engine cleared"),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(engine = name, "Index does not exist yet, nothing to clear")
                }
                Err(e) => {
                    tracing::error!(engine = name, error = %e, "Failed to clear engine");
                    if first_error.is_none() {
                        first_error = Some(BenchError::setup(name, Phase::Cleared, e));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Send every chunk to every engine; returns failed batches per engine
    async fn ingest(&self, docs: &[D]) -> BTreeMap<String, usize> {
        let mut failures: BTreeMap<String, usize> = self
            .engines
            .iter()
            .map(|e| (e.name().to_string(), 0))
            .collect();

        let chunk_size = self.config.ingest_chunk_size;
        let total_chunks = docs.len().div_ceil(chunk_size);
        tracing::info!(
            documents = docs.len(),
            chunk_size,
            chunks = total_chunks,
            "Inserting documents"
        );

        for (idx, chunk) in make_chunks(docs, chunk_size).enumerate() {
            let results = join_all(
                self.engines
                    .iter()
                    .map(|engine| async move { (engine.name(), engine.insert_batch(chunk).await) }),
            )
            .await;

            for (name, result) in results {
                if let Err(e) = result {
                    tracing::warn!(
                        engine = name,
                        chunk = idx + 1,
                        documents = chunk.len(),
                        error = %e,
                        "Failed to insert batch"
                    );
                    *failures.entry(name.to_string()).or_default() += 1;
                }
            }

            tracing::debug!(chunk = idx + 1, chunks = total_chunks, "Chunk inserted");
        }

        failures
    }

    async fn wait_until_indexed(&self, expected: usize) -> BenchResult<()> {
        tracing::info!(expected, "Waiting for engines to index documents");
        let results = join_all(self.engines.iter().map(|engine| async move {
            let start = Instant::now();
            let result = engine.wait_until_indexed(expected).await;
            (engine.name(), start.elapsed(), result)
        }))
        .await;

        let mut first_error = None;
        for (name, waited, result) in results {
            match result {
                Ok(()) => tracing::info!(
                    engine = name,
                    waited_secs = waited.as_secs_f64(),
                    "Documents indexed"
                ),
                Err(e) => {
                    tracing::error!(engine = name, error = %e, "Indexing did not complete");
                    if first_error.is_none() {
                        first_error = Some(BenchError::setup(name, Phase::IndexSynced, e));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn run_query(
        &self,
        executor: &QueryExecutor,
        query: Query,
        summary: &mut RunSummary,
    ) -> BenchResult<()> {
        for engine in &self.engines {
            if !engine.supports(query) {
                tracing::info!(
                    engine = engine.name(),
                    query = %query,
                    "Query not supported, skipping"
                );
                summary.skipped.push((engine.name().to_string(), query));
                continue;
            }

            tracing::info!(engine = engine.name(), query = %query, "Executing query");
            let result = match executor.execute(Arc::clone(engine), query).await {
                Ok(result) => result,
                Err(BenchError::Executor(message)) => {
                    tracing::error!(
                        engine = engine.name(),
                        query = %query,
                        error = %message,
                        "Query run aborted, moving on"
                    );
                    summary.reports.push(QueryReport {
                        engine: engine.name().to_string(),
                        query,
                        successes: 0,
                        failures: self.config.repeats,
                        total_duration_ms: 0.0,
                        percentiles: None,
                        error: Some(message),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let percentiles = match result.percentiles() {
                Ok(p) => {
                    tracing::info!(
                        engine = engine.name(),
                        query = %query,
                        total_ms = duration_ms(&result.total_duration),
                        "Query time percentiles: {}",
                        p
                    );
                    Some(p)
                }
                Err(PercentileError::Empty) => {
                    tracing::warn!(
                        engine = engine.name(),
                        query = %query,
                        "Every call failed, no percentiles"
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            };

            if result.failures > 0 {
                tracing::warn!(
                    engine = engine.name(),
                    query = %query,
                    failures = result.failures,
                    repeats = result.repeats,
                    "Some calls failed"
                );
            }

            summary.reports.push(QueryReport {
                engine: result.engine,
                query,
                successes: result.durations.len(),
                failures: result.failures,
                total_duration_ms: duration_ms(&result.total_duration),
                percentiles,
                error: None,
            });
        }

        Ok(())
    }
}

impl<D: Document> std::fmt::Debug for Benchmark<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("config", &self.config)
            .field("engines", &self.engine_names())
            .field("queries", &self.queries)
            .field("generator", &self.generator.name())
            .field("phase", &self.phase)
            .finish()
    }
}
