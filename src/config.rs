//! Pipeline and CLI configuration.
//!
//! The core pipeline takes an explicit [`PipelineConfig`] value — no
//! ambient globals (Design Notes §9 "Global state"). [`Config`] is the
//! ambient CLI-facing wrapper the `mapfusion` binary builds from `clap`
//! flags, shaped after the teacher's `Cli`/`Commands` struct in
//! `src/bin/plexus.rs`.

use std::path::PathBuf;

/// Default per-source-category concurrency limit (spec.md §5).
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Concurrency is clamped to `1..=6` (spec.md §5 "bounded per-source
/// semaphore, default 1-6 in-flight").
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 6;

/// Configuration threaded explicitly through `Aggregator::run` — never an
/// ambient global.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Overrides the schema version stamped into rendered output; falls
    /// back to the crate version when unset.
    pub schema_version: Option<String>,
    /// Path to `mappings.edits.yaml`, if an overlay should be applied.
    pub edits_file: Option<PathBuf>,
    /// Per-source-category in-flight concurrency limit, clamped to
    /// `1..=6`.
    pub concurrency: usize,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edits_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.edits_file = Some(path.into());
        self
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = Some(version.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY);
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema_version: None,
            edits_file: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// CLI-level configuration: output paths plus the embedded pipeline knobs.
/// Built by `src/bin/mapfusion.rs` from `clap` flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub output_path: PathBuf,
    pub stats_path: Option<PathBuf>,
}

impl Config {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            pipeline: PipelineConfig::new(),
            output_path: output_path.into(),
            stats_path: None,
        }
    }
}
