//! Worker statistics tracking

use std::time::Duration;

/// Statistics tracked by each query worker
///
/// Workers own their stats exclusively; the executor merges them once every
/// worker has returned.
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Latency of every successful call
    pub durations: Vec<Duration>,

    /// Number of failed calls
    pub failures: usize,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful calls
    pub fn successes(&self) -> usize {
        self.durations.len()
    }

    /// Get total number of calls (successes + failures)
    pub fn total_calls(&self) -> usize {
        self.successes() + self.failures
    }

    /// Record a successful call
    pub fn record_success(&mut self, latency: Duration) {
        self.durations.push(latency);
    }

    /// Record a failed call
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Merge stats from another worker
    pub fn merge(&mut self, other: WorkerStats) {
        self.durations.extend(other.durations);
        self.failures += other.failures;
    }
}
