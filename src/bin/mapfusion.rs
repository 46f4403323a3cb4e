//! mapfusion CLI — renders the canonical mapping payload and stats
//! document from the in-tree reference pipeline (spec.md §6.5).
//!
//! The real source adapters (HTTP/YAML/XML/SPARQL fetchers), the file
//! writers for compressed/minified copies, and the legacy-payload
//! migration helpers are named external collaborators in spec.md §1 and
//! are not part of this binary; it exists only to exercise the core
//! pipeline end to end against the reference fixture sources in
//! `src/source/reference/`.

use clap::{Parser, Subcommand};
use mapfusion::config::PipelineConfig;
use mapfusion::{aggregator::default_pipeline, render::render_payload, stats::build_stats};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mapfusion", version, about = "Cross-provider anime episode-range mapping fusion engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write the canonical mappings.json payload.
    Render {
        /// Output path for the pretty-printed payload.
        #[arg(long, default_value = "mappings.json")]
        out: PathBuf,
        /// Path to a mappings.edits.yaml overlay file, if any.
        #[arg(long)]
        edits: Option<PathBuf>,
        /// Also write a minified copy alongside `out`. Not yet
        /// implemented by this binary (spec.md §6.5 Non-goal on file
        /// writers) — rejected rather than silently ignored.
        #[arg(long)]
        minify: bool,
        /// Also write a zstd-compressed copy alongside `out`. Not yet
        /// implemented by this binary (spec.md §6.5 Non-goal on file
        /// writers) — rejected rather than silently ignored.
        #[arg(long)]
        zstd: bool,
        /// Per-source-category concurrency, clamped to 1..=6.
        #[arg(long, default_value_t = mapfusion::config::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Run the pipeline and write a stats document summarizing provider
    /// coverage and validator-issue counts.
    Stats {
        /// Output path for the stats document.
        #[arg(long, default_value = "stats.json")]
        out: PathBuf,
        /// Path to a mappings.edits.yaml overlay file, if any.
        #[arg(long)]
        edits: Option<PathBuf>,
        #[arg(long, default_value_t = mapfusion::config::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Render { out, edits, minify, zstd, concurrency } => {
            if minify || zstd {
                return Err("minified/zstd output is not implemented by this binary; write the pretty payload and post-process it externally".into());
            }

            let mut config = PipelineConfig::new().with_concurrency(concurrency);
            if let Some(edits_file) = edits {
                config = config.with_edits_file(edits_file);
            }

            let aggregator = default_pipeline();
            let artifacts = aggregator.run(&config).await?;
            let payload = render_payload(&artifacts.episode_graph, chrono::Utc::now(), mapfusion::VERSION);
            std::fs::write(&out, payload.to_pretty_json())?;
            tracing::info!(path = %out.display(), entries = payload.entries.len(), "wrote mappings payload");
            Ok(())
        }
        Commands::Stats { out, edits, concurrency } => {
            let mut config = PipelineConfig::new().with_concurrency(concurrency);
            if let Some(edits_file) = edits {
                config = config.with_edits_file(edits_file);
            }

            let aggregator = default_pipeline();
            let artifacts = aggregator.run(&config).await?;
            let payload = render_payload(&artifacts.episode_graph, chrono::Utc::now(), mapfusion::VERSION);
            let stats = build_stats(&artifacts, &payload);
            std::fs::write(&out, serde_json::to_string_pretty(&stats)?)?;
            tracing::info!(path = %out.display(), "wrote stats document");
            Ok(())
        }
    }
}
