//! Latency percentiles and per-run reporting types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::traits::Query;

/// Percentiles reported for every (engine, query) pair
pub const REPORTED_PERCENTILES: [f64; 8] = [5.0, 20.0, 50.0, 75.0, 90.0, 95.0, 99.0, 100.0];

/// Percentile computation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PercentileError {
    /// No samples to aggregate
    #[error("cannot compute a percentile of an empty sample set")]
    Empty,

    /// Requested percentile outside [0, 100]
    #[error("percentile out of range: {0}")]
    OutOfRange(f64),

    /// A sample was NaN or negative
    #[error("invalid latency sample: {0}")]
    InvalidSample(f64),
}

/// Value at percentile `p` (0..=100) of `samples`
///
/// Samples are sorted first, so input order never changes the result. The
/// rank is `p / 100 * (n - 1)` and values between two ranks are linearly
/// interpolated.
pub fn percentile(samples: &[f64], p: f64) -> Result<f64, PercentileError> {
    let sorted = sorted_samples(samples)?;
    percentile_of_sorted(&sorted, p)
}

fn sorted_samples(samples: &[f64]) -> Result<Vec<f64>, PercentileError> {
    if samples.is_empty() {
        return Err(PercentileError::Empty);
    }
    if let Some(bad) = samples.iter().find(|v| v.is_nan() || **v < 0.0) {
        return Err(PercentileError::InvalidSample(*bad));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> Result<f64, PercentileError> {
    if !(0.0..=100.0).contains(&p) {
        return Err(PercentileError::OutOfRange(p));
    }
    if sorted.len() == 1 {
        return Ok(sorted[0]);
    }

    let idx = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    Ok(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
}

/// Latency percentiles (all values in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    /// 5th percentile
    pub p5: f64,
    /// 20th percentile
    pub p20: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// 100th percentile (maximum)
    pub p100: f64,
}

impl LatencyPercentiles {
    /// Calculate the reported percentile set from unordered samples
    pub fn from_samples(samples: &[f64]) -> Result<Self, PercentileError> {
        let sorted = sorted_samples(samples)?;
        let at = |p: f64| percentile_of_sorted(&sorted, p);

        Ok(Self {
            p5: at(5.0)?,
            p20: at(20.0)?,
            p50: at(50.0)?,
            p75: at(75.0)?,
            p90: at(90.0)?,
            p95: at(95.0)?,
            p99: at(99.0)?,
            p100: at(100.0)?,
        })
    }

    /// Calculate percentiles from durations
    pub fn from_durations(durations: &[Duration]) -> Result<Self, PercentileError> {
        let samples: Vec<f64> = durations.iter().map(duration_ms).collect();
        Self::from_samples(&samples)
    }

    /// Percentile/value pairs in reporting order
    pub fn pairs(&self) -> [(f64, f64); 8] {
        [
            (5.0, self.p5),
            (20.0, self.p20),
            (50.0, self.p50),
            (75.0, self.p75),
            (90.0, self.p90),
            (95.0, self.p95),
            (99.0, self.p99),
            (100.0, self.p100),
        ]
    }
}

impl std::fmt::Display for LatencyPercentiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .pairs()
            .iter()
            .map(|(p, v)| format!("%{}={:.2}ms", p, v))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Milliseconds in `d` as a float
pub fn duration_ms(d: &Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Outcome of one query phase on one engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    /// Engine name
    pub engine: String,
    /// Query kind
    pub query: Query,
    /// Successful calls
    pub successes: usize,
    /// Failed calls (excluded from percentiles)
    pub failures: usize,
    /// Wall-clock span of the whole parallel run (ms)
    pub total_duration_ms: f64,
    /// Percentiles over successful calls; `None` when every call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<LatencyPercentiles>,
    /// Why the run for this pair was cut short, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryReport {
    /// Calls made (successes + failures)
    pub fn total_calls(&self) -> usize {
        self.successes + self.failures
    }

    /// Failure rate (0.0 - 1.0)
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_calls();
        if total > 0 {
            self.failures as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Summary of a whole benchmark run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Documents generated and ingested
    pub document_count: usize,
    /// Failed insert batches per engine
    pub ingest_failures: BTreeMap<String, usize>,
    /// One report per executed (engine, query) pair, in execution order
    pub reports: Vec<QueryReport>,
    /// (engine, query) pairs skipped as unsupported
    pub skipped: Vec<(String, Query)>,
}

impl RunSummary {
    /// Report for a given pair, if it ran
    pub fn report(&self, engine: &str, query: Query) -> Option<&QueryReport> {
        self.reports
            .iter()
            .find(|r| r.engine == engine && r.query == query)
    }
}
