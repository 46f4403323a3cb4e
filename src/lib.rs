//! mapfusion: cross-provider anime identifier and episode-range mapping
//! fusion engine.
//!
//! Sources contribute identifier equivalences, metadata, and direct
//! episode-range mappings; the aggregator unions them into a shared
//! identifier graph and episode graph, infers additional episode links
//! from matching metadata, applies an optional manual-edits overlay,
//! validates the result, and renders the canonical `mappings.json`
//! payload plus an optional stats document.
//!
//! # Example
//!
//! ```no_run
//! use mapfusion::{config::PipelineConfig, aggregator::default_pipeline, render::render_payload};
//! use chrono::Utc;
//!
//! # async fn run() -> Result<(), mapfusion::error::MapFusionError> {
//! let aggregator = default_pipeline();
//! let artifacts = aggregator.run(&PipelineConfig::new()).await?;
//! let payload = render_payload(&artifacts.episode_graph, Utc::now(), mapfusion::VERSION);
//! println!("{}", payload.to_pretty_json());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod descriptor;
pub mod edits;
pub mod error;
pub mod graph;
pub mod inference;
pub mod meta;
pub mod provenance;
pub mod range;
pub mod render;
pub mod source;
pub mod stats;
pub mod validators;

pub use aggregator::{default_pipeline, Aggregator, Artifacts};
pub use config::{Config, PipelineConfig};
pub use descriptor::Descriptor;
pub use error::{MapFusionError, MapFusionResult};
pub use graph::{EpisodeGraph, IdentifierGraph};
pub use meta::{MetaStore, SourceMeta, SourceType};
pub use render::{render_payload, Payload};
pub use stats::build_stats;

/// Library version, also used as the default `$meta.schema_version`
/// stamp when a pipeline run doesn't override it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
