//! Concurrent query executor
//!
//! Runs one (engine, query) pair exactly `repeats` times using exactly
//! `concurrency` tokio tasks. Workers share nothing but a [`WorkCountdown`];
//! each keeps its own latencies and the executor merges them after every
//! worker has joined.
//!
//! # Example
//!
//! ```ignore
//! use search_bench_core::{ExecutorConfig, Query, QueryExecutor};
//!
//! let executor = QueryExecutor::new(ExecutorConfig::new(10, 200));
//! let result = executor.execute(engine, Query::SingleWord).await?;
//! println!("{} samples in {:?}", result.durations.len(), result.total_duration);
//! ```

mod stats;
mod worker;

pub use stats::WorkerStats;
pub use worker::{WorkCountdown, Worker};

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};
use crate::metrics::{duration_ms, LatencyPercentiles, PercentileError};
use crate::traits::{Document, Query, SearchEngine};

/// Query load parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Parallel workers (in-flight calls against one engine)
    pub concurrency: usize,
    /// Total calls per run
    pub repeats: usize,
}

impl ExecutorConfig {
    /// Create a new executor config
    pub fn new(concurrency: usize, repeats: usize) -> Self {
        Self {
            concurrency,
            repeats,
        }
    }
}

/// Samples collected by one executor run
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Engine name
    pub engine: String,
    /// Query kind
    pub query: Query,
    /// Latency of every successful call, in completion order per worker
    pub durations: Vec<Duration>,
    /// Failed calls (not part of `durations`)
    pub failures: usize,
    /// Wall clock from before the first spawn to after the last join
    pub total_duration: Duration,
    /// Concurrency used
    pub concurrency: usize,
    /// Repeats requested
    pub repeats: usize,
}

impl ExecutionResult {
    /// Successful-call latencies in milliseconds
    pub fn latencies_ms(&self) -> Vec<f64> {
        self.durations.iter().map(duration_ms).collect()
    }

    /// Percentiles over successful calls
    pub fn percentiles(&self) -> Result<LatencyPercentiles, PercentileError> {
        LatencyPercentiles::from_durations(&self.durations)
    }
}

/// Executes repeated single-query calls with bounded concurrency
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor {
    config: ExecutorConfig,
}

impl QueryExecutor {
    /// Create a new executor
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Get the executor configuration
    pub fn config(&self) -> ExecutorConfig {
        self.config
    }

    /// Run `query` against `engine` `repeats` times with `concurrency` workers
    ///
    /// # Errors
    ///
    /// Returns an error if a worker task panics or is cancelled, since its
    /// samples would otherwise be silently missing.
    pub async fn execute<D: Document>(
        &self,
        engine: Arc<dyn SearchEngine<D>>,
        query: Query,
    ) -> BenchResult<ExecutionResult> {
        let ExecutorConfig {
            concurrency,
            repeats,
        } = self.config;
        if concurrency == 0 {
            return Err(BenchError::config("concurrency must be at least 1"));
        }

        let countdown = Arc::new(WorkCountdown::new(repeats));
        let start = Instant::now();

        let handles: Vec<_> = (0..concurrency)
            .map(|worker_id| {
                let worker = Worker::new(
                    worker_id,
                    Arc::clone(&engine),
                    query,
                    Arc::clone(&countdown),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        let mut merged = WorkerStats::new();
        let mut worker_failures = 0;
        for (idx, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(stats) => merged.merge(stats),
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Query worker panicked");
                }
            }
        }

        let total_duration = start.elapsed();

        if worker_failures > 0 {
            return Err(BenchError::executor(format!(
                "{} of {} workers for {} on {} did not complete; {} of {} calls recorded",
                worker_failures,
                concurrency,
                query,
                engine.name(),
                merged.total_calls(),
                repeats
            )));
        }

        Ok(ExecutionResult {
            engine: engine.name().to_string(),
            query,
            durations: merged.durations,
            failures: merged.failures,
            total_duration,
            concurrency,
            repeats,
        })
    }
}
