//! Benchmark presets: which corpus, which queries, which engines

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use search_bench_core::{
    BenchError, Benchmark, BenchmarkBuilder, BenchmarkConfig, Document, DocumentGenerator, Query,
    RunSummary, SearchEngine,
};
use search_bench_engines::{create_engine, EngineConfig};
use search_bench_generators::{
    Article, ArticleGenerator, WikipediaAbstractGenerator, WikipediaArticleAbstract,
};

/// Named benchmark setups
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Synthetic articles, single-word queries, every engine must support them
    Articles,
    /// Wikipedia abstracts from a dump, every query kind, unsupported ones skipped
    WikipediaArticleAbstract,
}

impl Preset {
    /// Index every engine stores the corpus in
    pub fn index_name(&self) -> &'static str {
        match self {
            Preset::Articles => "articles",
            Preset::WikipediaArticleAbstract => "wikipedia-article-abstract",
        }
    }

    /// Query kinds the preset runs, in order
    pub fn queries(&self) -> &'static [Query] {
        match self {
            Preset::Articles => &[Query::SingleWord],
            Preset::WikipediaArticleAbstract => Query::all(),
        }
    }

    /// Whether unsupported (engine, query) pairs are skipped
    pub fn ignores_unsupported_queries(&self) -> bool {
        matches!(self, Preset::WikipediaArticleAbstract)
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Articles => write!(f, "articles"),
            Preset::WikipediaArticleAbstract => write!(f, "wikipedia-article-abstract"),
        }
    }
}

/// Everything a preset needs besides its own defaults
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Load and ingestion settings; `ignore_unsupported_queries` is set by the preset
    pub config: BenchmarkConfig,
    /// Engines to benchmark; their index name is set by the preset
    pub engines: Vec<EngineConfig>,
    /// Abstract dump, required by the wikipedia preset
    pub wikipedia_abstract_path: Option<PathBuf>,
}

/// Build and run `preset`, stopping on Ctrl+C
pub async fn run(preset: Preset, options: RunOptions) -> Result<RunSummary> {
    match preset {
        Preset::Articles => {
            let benchmark = build::<Article, _>(preset, &options, ArticleGenerator::new())?;
            execute(benchmark).await
        }
        Preset::WikipediaArticleAbstract => {
            let generator = wikipedia_generator(&options)?;
            let benchmark = build::<WikipediaArticleAbstract, _>(preset, &options, generator)?;
            execute(benchmark).await
        }
    }
}

fn wikipedia_generator(options: &RunOptions) -> Result<WikipediaAbstractGenerator> {
    let path = options
        .wikipedia_abstract_path
        .as_ref()
        .ok_or_else(|| BenchError::missing_config("--wikipedia-abstract-path"))?;

    WikipediaAbstractGenerator::new(path)
        .map_err(|e| BenchError::config(e.to_string()))
        .context("wikipedia-article-abstract preset")
}

/// Assemble the benchmark without contacting any engine
pub fn build<D, G>(preset: Preset, options: &RunOptions, generator: G) -> Result<Benchmark<D>>
where
    D: Document,
    G: DocumentGenerator<D> + 'static,
{
    let mut engines: Vec<Arc<dyn SearchEngine<D>>> = Vec::with_capacity(options.engines.len());
    for config in &options.engines {
        let mut config = config.clone();
        config.index_name = preset.index_name().to_string();
        let engine = config.engine;
        engines.push(
            create_engine(config).with_context(|| format!("cannot set up {}", engine.id()))?,
        );
    }

    let config = options
        .config
        .clone()
        .with_ignore_unsupported_queries(preset.ignores_unsupported_queries());

    let benchmark = BenchmarkBuilder::new()
        .config(config)
        .engines(engines)
        .queries(preset.queries().iter().copied())
        .generator(generator)
        .build()
        .with_context(|| format!("invalid {} benchmark", preset))?;

    Ok(benchmark)
}

async fn execute<D: Document>(mut benchmark: Benchmark<D>) -> Result<RunSummary> {
    tracing::info!(benchmark = ?benchmark, "Benchmark ready");
    let summary = benchmark.run_with_signal_handling().await?;
    Ok(summary)
}
