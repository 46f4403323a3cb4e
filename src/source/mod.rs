//! Source-adapter contract (spec.md §6.1): the pluggable producers the
//! aggregator pulls from before a pipeline run.
//!
//! Grounded on `anibridge_mappings/sources/base.py`'s `BaseSource` /
//! `IdMappingSource` / `MetadataSource` / `EpisodeMappingSource`
//! protocols, reshaped as Rust traits in the teacher's
//! `adapter/traits.rs` `async_trait` style. A concrete source implements
//! any combination of the three capability traits alongside the shared
//! [`Source`] base; nothing requires a source to implement all three.
//!
//! Real network/XML/SPARQL clients are out of scope here (spec.md §1
//! "deliberately out of scope"): [`reference`] holds small in-tree
//! fixture sources only, enough to exercise the aggregator end to end.

use crate::graph::{EpisodeGraph, IdentifierGraph};
use crate::meta::MetaStore;
use async_trait::async_trait;
use std::sync::Arc;

/// A source failed during `prepare` or collection. The aggregator logs
/// and continues past an individual source's failure rather than
/// aborting the run (spec.md §5).
#[derive(Debug, thiserror::Error)]
#[error("source '{source}' failed: {message}")]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

impl SourceError {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self { source: source.into(), message: message.into() }
    }
}

/// Identity shared by every source. `prepare` fetches or caches
/// upstream data; it runs for every registered source, concurrently
/// and bounded by [`crate::config::PipelineConfig::concurrency`],
/// before any `build_*`/`collect_*` call (spec.md §4.3 step 1, §5).
#[async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    async fn prepare(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// A source capable of emitting identifier relationships.
pub trait IdSource: Source {
    fn build_id_graph(&self) -> IdentifierGraph;
}

/// A source capable of enriching the shared metadata store. `id_graph`
/// is already the union of every `IdSource`'s output, so a metadata
/// source can restrict itself to the entries it actually owns.
#[async_trait]
pub trait MetaSource: Source {
    async fn collect_metadata(&self, id_graph: &IdentifierGraph) -> MetaStore;
}

/// A source capable of emitting episode-level mappings.
pub trait EpisodeSource: Source {
    fn build_episode_graph(&self, meta_store: &MetaStore, id_graph: &IdentifierGraph) -> EpisodeGraph;
}

/// Thin-pointer identity for an `Arc`-held source, used to deduplicate
/// sources registered under more than one capability list (spec.md
/// §4.3 step 1 "deduplicate registered sources by identity before
/// preparing them").
pub(crate) fn source_identity<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as *const () as usize
}

pub mod reference;
