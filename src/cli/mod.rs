//! CLI argument parsing and command handling

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_bench_core::{BenchmarkConfig, RunSummary, DEFAULT_INGEST_CHUNK_SIZE};
use search_bench_engines::{Engine, EngineConfig};

use crate::presets::{self, Preset, RunOptions};

/// search-bench - Comparative load testing for search engines
#[derive(Parser, Debug)]
#[command(name = "search-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a benchmark preset against every configured engine
    Run(RunArgs),
}

/// Arguments of `search-bench run`
#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Benchmark preset
    #[arg(value_enum)]
    pub preset: Preset,

    /// Concurrent query workers per engine and query
    #[arg(short, long, default_value_t = 10)]
    pub concurrency: usize,

    /// Query calls per engine and query
    #[arg(short = 'n', long, default_value_t = 10)]
    pub requests: usize,

    /// Documents to ingest (defaults to the preset's corpus size)
    #[arg(short, long)]
    pub documents: Option<usize>,

    /// Documents per insert batch
    #[arg(long, default_value_t = DEFAULT_INGEST_CHUNK_SIZE)]
    pub ingest_chunk_size: usize,

    /// Path to an enwiki-*-abstract.xml dump (wikipedia-article-abstract preset)
    #[arg(long)]
    pub wikipedia_abstract_path: Option<PathBuf>,

    /// Engines to benchmark, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = Engine::all().to_vec())]
    pub engines: Vec<Engine>,

    /// Meilisearch address
    #[arg(long, env = "MEILISEARCH_URL", default_value = "http://localhost:7700")]
    pub meilisearch_url: String,

    /// OpenSearch address
    #[arg(long, env = "OPENSEARCH_URL", default_value = "http://localhost:9200")]
    pub opensearch_url: String,

    /// Quickwit address
    #[arg(long, env = "QUICKWIT_URL", default_value = "http://localhost:7280")]
    pub quickwit_url: String,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    fn address(&self, engine: Engine) -> &str {
        match engine {
            Engine::Meilisearch => &self.meilisearch_url,
            Engine::OpenSearch => &self.opensearch_url,
            Engine::Quickwit => &self.quickwit_url,
        }
    }

    /// Engines from `--engines`, first occurrence wins
    pub fn selected_engines(&self) -> Vec<Engine> {
        let mut engines: Vec<Engine> = Vec::new();
        for engine in &self.engines {
            if !engines.contains(engine) {
                engines.push(*engine);
            }
        }
        engines
    }

    /// Translate the flags into preset options
    pub fn options(&self) -> RunOptions {
        let config = BenchmarkConfig::new(self.concurrency, self.requests)
            .with_ingest_chunk_size(self.ingest_chunk_size)
            .with_document_count(self.documents);

        RunOptions {
            config,
            engines: self
                .selected_engines()
                .into_iter()
                .map(|e| EngineConfig::new(e, self.address(e), self.preset.index_name()))
                .collect(),
            wikipedia_abstract_path: self.wikipedia_abstract_path.clone(),
        }
    }

    /// Run the selected preset and print its results
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            preset = %self.preset,
            engines = ?self.selected_engines(),
            concurrency = self.concurrency,
            requests = self.requests,
            "Starting search-bench"
        );

        let summary = presets::run(self.preset, self.options()).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&summary)
                .context("Failed to serialize run summary")?;
            println!("{}", json);
        } else {
            print_results(self.preset, &summary);
        }

        Ok(())
    }
}

impl Cli {
    /// Dispatch the parsed command
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Run(args) => args.run().await,
        }
    }
}

fn print_results(preset: Preset, summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(70));
    println!("   Benchmark Results: {}", preset);
    println!("{}", "=".repeat(70));
    println!();
    println!("Documents ingested:     {}", summary.document_count);
    for (engine, failures) in &summary.ingest_failures {
        if *failures > 0 {
            println!("  {} failed batches:   {}", engine, failures);
        }
    }
    println!();

    for report in &summary.reports {
        println!("{} / {}:", report.engine, report.query);
        if let Some(error) = &report.error {
            println!("  Aborted:              {}", error);
            println!();
            continue;
        }
        println!(
            "  Calls:                {} ok, {} failed ({:.1}%)",
            report.successes,
            report.failures,
            report.failure_rate() * 100.0
        );
        println!("  Total time:           {:.2} ms", report.total_duration_ms);
        match &report.percentiles {
            Some(p) => {
                for (percentile, value) in p.pairs() {
                    println!("  p{:<20} {:.2} ms", percentile, value);
                }
            }
            None => println!("  No successful calls"),
        }
        println!();
    }

    for (engine, query) in &summary.skipped {
        println!("Skipped {} / {} (not supported)", engine, query);
    }

    println!("{}", "=".repeat(70));
}
