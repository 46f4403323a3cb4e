//! Shared fixture sources for integration tests: minimal `Source`
//! implementations that hand back pre-built contributions instead of
//! fetching anything, so each test can assemble exactly the
//! identifier/metadata/episode shape a spec.md §8 scenario calls for.

use async_trait::async_trait;
use mapfusion::descriptor::Descriptor;
use mapfusion::graph::episode::EpisodeNode;
use mapfusion::graph::{EpisodeGraph, IdentifierGraph};
use mapfusion::meta::MetaStore;
use mapfusion::source::{EpisodeSource, IdSource, MetaSource, Source, SourceError};

/// An identifier source that connects one equivalence class of
/// descriptors.
pub struct FixedIdSource {
    pub label: &'static str,
    pub class: Vec<Descriptor>,
}

#[async_trait]
impl Source for FixedIdSource {
    fn name(&self) -> &str {
        self.label
    }
}

impl IdSource for FixedIdSource {
    fn build_id_graph(&self) -> IdentifierGraph {
        let mut graph = IdentifierGraph::new();
        graph.add_equivalence_class(self.class.clone());
        graph
    }
}

/// A metadata source that hands back a fixed `MetaStore`.
pub struct FixedMetaSource {
    pub label: &'static str,
    pub store: MetaStore,
}

#[async_trait]
impl Source for FixedMetaSource {
    fn name(&self) -> &str {
        self.label
    }
}

#[async_trait]
impl MetaSource for FixedMetaSource {
    async fn collect_metadata(&self, _id_graph: &IdentifierGraph) -> MetaStore {
        self.store.clone()
    }
}

/// An episode source that emits a fixed list of `(source, target)` range
/// pairs.
pub struct FixedEpisodeSource {
    pub label: &'static str,
    pub edges: Vec<(Descriptor, &'static str, Descriptor, &'static str)>,
}

#[async_trait]
impl Source for FixedEpisodeSource {
    fn name(&self) -> &str {
        self.label
    }
}

impl EpisodeSource for FixedEpisodeSource {
    fn build_episode_graph(&self, _meta: &MetaStore, _id_graph: &IdentifierGraph) -> EpisodeGraph {
        let mut graph = EpisodeGraph::new();
        for (source_descriptor, source_range, target_descriptor, target_range) in &self.edges {
            graph.add_edge_with_provenance(
                EpisodeNode::new(source_descriptor.clone(), *source_range),
                EpisodeNode::new(target_descriptor.clone(), *target_range),
                None,
            );
        }
        graph
    }
}

/// A source that always fails `prepare()`, to exercise the "a source
/// fails; the pipeline continues" property (spec.md §5, §7).
pub struct FailingSource {
    pub label: &'static str,
}

#[async_trait]
impl Source for FailingSource {
    fn name(&self) -> &str {
        self.label
    }

    async fn prepare(&self) -> Result<(), SourceError> {
        Err(SourceError::new(self.label, "simulated upstream failure"))
    }
}

impl IdSource for FailingSource {
    fn build_id_graph(&self) -> IdentifierGraph {
        IdentifierGraph::new()
    }
}
