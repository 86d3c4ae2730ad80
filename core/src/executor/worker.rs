//! Worker loop: claim -> execute -> record -> repeat

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::traits::{Document, Query, SearchEngine};

use super::stats::WorkerStats;

/// Remaining work shared by every worker of one query run
///
/// A claim is a checked decrement, so two workers can never take the same
/// unit and the counter never wraps below zero.
#[derive(Debug)]
pub struct WorkCountdown {
    remaining: AtomicUsize,
}

impl WorkCountdown {
    /// Create a countdown holding `total` units of work
    pub fn new(total: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(total),
        }
    }

    /// Claim one unit; `false` once the countdown reached zero
    pub fn try_claim(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Units not yet claimed
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

/// Worker issuing one query kind against one engine until the countdown is empty
pub struct Worker<D: Document> {
    /// Unique worker identifier
    id: usize,

    /// Engine under test (shared across workers via Arc)
    engine: Arc<dyn SearchEngine<D>>,

    /// Query kind to issue
    query: Query,

    /// Shared countdown
    countdown: Arc<WorkCountdown>,
}

impl<D: Document> Worker<D> {
    /// Create a new worker
    pub fn new(
        id: usize,
        engine: Arc<dyn SearchEngine<D>>,
        query: Query,
        countdown: Arc<WorkCountdown>,
    ) -> Self {
        Self {
            id,
            engine,
            query,
            countdown,
        }
    }

    /// Run the worker loop
    ///
    /// Returns once no work is left. A failed call is counted and the worker
    /// moves on to its next claim.
    pub async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats::new();

        tracing::trace!(worker_id = self.id, "Worker started");

        while self.countdown.try_claim() {
            let start = Instant::now();
            let result = self.engine.execute(self.query).await;
            let latency = start.elapsed();

            match result {
                Ok(()) => stats.record_success(latency),
                Err(e) => {
                    stats.record_failure();
                    tracing::warn!(
                        worker_id = self.id,
                        engine = self.engine.name(),
                        query = %self.query,
                        error = %e,
                        "Query failed"
                    );
                }
            }
        }

        tracing::trace!(
            worker_id = self.id,
            successes = stats.successes(),
            failures = stats.failures,
            "Worker finished"
        );

        stats
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<D: Document> std::fmt::Debug for Worker<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("engine", &self.engine.name())
            .field("query", &self.query)
            .field("remaining", &self.countdown.remaining())
            .finish()
    }
}
