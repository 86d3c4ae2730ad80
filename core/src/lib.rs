//! search-bench-core: Core types for benchmarking search engines side by side
//!
//! This crate provides everything that does not depend on a concrete engine
//! or corpus:
//!
//! - Core traits (SearchEngine, DocumentGenerator, Document)
//! - The concurrent query executor
//! - The benchmark orchestrator and its lifecycle phases
//! - Percentile aggregation and run reports
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod orchestrator;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use config::*;
pub use error::*;
pub use executor::{ExecutionResult, ExecutorConfig, QueryExecutor, WorkerStats};
pub use metrics::*;
pub use orchestrator::{make_chunks, Benchmark, BenchmarkBuilder, Phase};
pub use traits::*;
