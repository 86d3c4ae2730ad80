//! Builder pattern for Benchmark construction

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::BenchmarkConfig;
use crate::error::{BenchError, BenchResult};
use crate::traits::{Document, DocumentGenerator, Query, SearchEngine};

use super::executor::Benchmark;

/// Builder for creating a Benchmark with proper configuration
///
/// All validation happens in [`build`](Self::build), before any engine is
/// contacted.
///
/// # Example
///
/// ```ignore
/// let benchmark = BenchmarkBuilder::new()
///     .engine(meilisearch)
///     .engine(quickwit)
///     .queries(vec![Query::SingleWord])
///     .generator(ArticleGenerator::new())
///     .concurrency(10)
///     .repeats(1000)
///     .build()?;
/// ```
pub struct BenchmarkBuilder<D: Document> {
    config: BenchmarkConfig,
    engines: Vec<Arc<dyn SearchEngine<D>>>,
    queries: Vec<Query>,
    generator: Option<Box<dyn DocumentGenerator<D>>>,
}

impl<D: Document> BenchmarkBuilder<D> {
    /// Create a new benchmark builder with default configuration
    pub fn new() -> Self {
        Self {
            config: BenchmarkConfig::default(),
            engines: Vec::new(),
            queries: Vec::new(),
            generator: None,
        }
    }

    /// Set the full benchmark configuration
    pub fn config(mut self, config: BenchmarkConfig) -> Self {
        self.config = config;
        self
    }

    /// Add one engine
    pub fn engine(mut self, engine: Arc<dyn SearchEngine<D>>) -> Self {
        self.engines.push(engine);
        self
    }

    /// Add several engines, keeping their order
    pub fn engines(mut self, engines: impl IntoIterator<Item = Arc<dyn SearchEngine<D>>>) -> Self {
        self.engines.extend(engines);
        self
    }

    /// Add one query kind
    pub fn query(mut self, query: Query) -> Self {
        self.queries.push(query);
        self
    }

    /// Add several query kinds, keeping their order
    pub fn queries(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        self.queries.extend(queries);
        self
    }

    /// Set the document generator
    pub fn generator(mut self, generator: impl DocumentGenerator<D> + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Set the concurrency level of the query phase
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the number of calls per (engine, query)
    pub fn repeats(mut self, repeats: usize) -> Self {
        self.config.repeats = repeats;
        self
    }

    /// Set the number of documents per insert batch
    pub fn ingest_chunk_size(mut self, size: usize) -> Self {
        self.config.ingest_chunk_size = size;
        self
    }

    /// Set the number of documents to generate
    pub fn document_count(mut self, count: Option<usize>) -> Self {
        self.config.document_count = count;
        self
    }

    /// Skip unsupported (engine, query) pairs instead of rejecting the build
    pub fn ignore_unsupported_queries(mut self, ignore: bool) -> Self {
        self.config.ignore_unsupported_queries = ignore;
        self
    }

    /// Build the benchmark
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the generator is not set, no engine
    /// is set, two engines share a name, or configuration validation fails.
    /// In strict mode, returns [`BenchError::UnsupportedQuery`] for the first
    /// query an engine does not declare.
    pub fn build(self) -> BenchResult<Benchmark<D>> {
        let generator = self
            .generator
            .ok_or_else(|| BenchError::missing_config("generator"))?;

        if self.engines.is_empty() {
            return Err(BenchError::config("at least one engine is required"));
        }

        let mut names = HashSet::new();
        for engine in &self.engines {
            if !names.insert(engine.name()) {
                return Err(BenchError::config(format!(
                    "engine \"{}\" is configured twice",
                    engine.name()
                )));
            }
        }

        self.config.validate()?;

        if !self.config.ignore_unsupported_queries {
            for query in &self.queries {
                if let Some(engine) = self.engines.iter().find(|e| !e.supports(*query)) {
                    return Err(BenchError::UnsupportedQuery {
                        query: *query,
                        engine: engine.name().to_string(),
                    });
                }
            }
        }

        Ok(Benchmark::new(
            self.config,
            self.engines,
            self.queries,
            generator,
        ))
    }
}

impl<D: Document> Default for BenchmarkBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}
