//! Orchestrator for the benchmark lifecycle
//!
//! A [`Benchmark`] drives every configured engine through the same strictly
//! sequential phases:
//!
//! 1. clear every engine (concurrently, all must succeed)
//! 2. generate the corpus once
//! 3. ingest it chunk by chunk, each chunk fanned out to every engine
//! 4. wait until every engine sees the full corpus
//! 5. run the query load per query kind, per supporting engine
//!
//! # Example
//!
//! ```ignore
//! use search_bench_core::{BenchmarkBuilder, Query};
//!
//! let mut benchmark = BenchmarkBuilder::new()
//!     .engine(meilisearch)
//!     .engine(opensearch)
//!     .queries(vec![Query::SingleWord])
//!     .generator(ArticleGenerator::new())
//!     .concurrency(10)
//!     .repeats(200)
//!     .build()?;
//!
//! let summary = benchmark.run_with_signal_handling().await?;
//! ```

mod builder;
mod executor;
mod phase;

pub use builder::BenchmarkBuilder;
pub use executor::{make_chunks, Benchmark};
pub use phase::Phase;
