//! In-tree fixture counterpart to `anime_lists.py`: instead of parsing
//! the upstream `anime-list-master.xml`, walks a small embedded table of
//! entries with the same shape (an AniDB id/season, an optional
//! cross-provider show id/season, and direct episode-to-episode
//! mappings).

use crate::descriptor::{normalize_anidb_scope, Descriptor};
use crate::graph::episode::EpisodeNode;
use crate::graph::{EpisodeGraph, IdentifierGraph};
use crate::meta::MetaStore;
use crate::source::{EpisodeSource, IdSource, Source, SourceError};
use async_trait::async_trait;

const DEFAULT_SEASON_SCOPE: &str = "s1";

/// One dataset row: an AniDB entry's cross-provider show mapping plus
/// its direct episode-to-episode correspondences.
#[derive(Debug, Clone)]
pub struct AnimeListEntry {
    pub anidb_id: String,
    /// Raw AniDB scope attribute as the upstream dataset carries it
    /// (`anime-list-master.xml`'s unnormalized attribute value), run
    /// through the alias table at descriptor-build time.
    pub anidb_scope_attr: Option<String>,
    pub tvdb_show: Option<String>,
    pub tvdb_scope: String,
    /// `(anidb_episode, tvdb_episode)` direct pairs.
    pub episode_pairs: Vec<(String, String)>,
}

impl AnimeListEntry {
    pub fn new(anidb_id: impl Into<String>) -> Self {
        Self {
            anidb_id: anidb_id.into(),
            anidb_scope_attr: None,
            tvdb_show: None,
            tvdb_scope: DEFAULT_SEASON_SCOPE.to_string(),
            episode_pairs: Vec::new(),
        }
    }

    /// Set the raw, unnormalized AniDB scope attribute. Aliases (`a`,
    /// `1`, `0`, `specials`, ...) are resolved via the alias table when
    /// the descriptor is built.
    pub fn with_anidb_scope_attr(mut self, attr: impl Into<String>) -> Self {
        self.anidb_scope_attr = Some(attr.into());
        self
    }

    pub fn with_tvdb(mut self, show_id: impl Into<String>, scope: impl Into<String>) -> Self {
        self.tvdb_show = Some(show_id.into());
        self.tvdb_scope = scope.into();
        self
    }

    pub fn with_episode_pair(mut self, anidb_episode: impl Into<String>, tvdb_episode: impl Into<String>) -> Self {
        self.episode_pairs.push((anidb_episode.into(), tvdb_episode.into()));
        self
    }

    fn anidb_descriptor(&self) -> Descriptor {
        let scope = normalize_anidb_scope(self.anidb_scope_attr.as_deref());
        Descriptor::new("anidb", &self.anidb_id, Some(scope))
    }

    fn tvdb_descriptor(&self) -> Option<Descriptor> {
        self.tvdb_show.as_ref().map(|id| Descriptor::new("tvdb_show", id, Some(self.tvdb_scope.clone())))
    }
}

/// Identifier and episode source backed by an embedded fixture table.
pub struct AnimeListsSource {
    entries: Vec<AnimeListEntry>,
}

impl AnimeListsSource {
    pub fn new(entries: Vec<AnimeListEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl Source for AnimeListsSource {
    fn name(&self) -> &str {
        "anime_lists"
    }
}

impl IdSource for AnimeListsSource {
    fn build_id_graph(&self) -> IdentifierGraph {
        let mut graph = IdentifierGraph::new();
        for entry in &self.entries {
            let Some(tvdb) = entry.tvdb_descriptor() else { continue };
            graph.add_equivalence_class([entry.anidb_descriptor(), tvdb]);
        }
        graph
    }
}

impl EpisodeSource for AnimeListsSource {
    fn build_episode_graph(&self, _meta_store: &MetaStore, _id_graph: &IdentifierGraph) -> EpisodeGraph {
        let mut graph = EpisodeGraph::new();
        for entry in &self.entries {
            let Some(tvdb) = entry.tvdb_descriptor() else { continue };
            let anidb = entry.anidb_descriptor();
            for (anidb_episode, tvdb_episode) in &entry.episode_pairs {
                let source_node = EpisodeNode::new(anidb.clone(), anidb_episode.clone());
                let target_node = EpisodeNode::new(tvdb.clone(), tvdb_episode.clone());
                graph.add_edge_with_provenance(source_node, target_node, None);
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnimeListsSource {
        AnimeListsSource::new(vec![AnimeListEntry::new("30")
            .with_tvdb("99", "s1")
            .with_episode_pair("1", "1")
            .with_episode_pair("2", "2")])
    }

    #[test]
    fn links_anidb_and_tvdb_ids() {
        let graph = sample().build_id_graph();
        let component = graph.connected_component(&Descriptor::new("anidb", "30", Some("R".into())));
        assert_eq!(component.len(), 2);
    }

    #[test]
    fn raw_scope_attribute_is_resolved_through_the_alias_table() {
        let graph = AnimeListsSource::new(vec![AnimeListEntry::new("40")
            .with_anidb_scope_attr("0")
            .with_tvdb("101", "s1")])
        .build_id_graph();
        let component = graph.connected_component(&Descriptor::new("anidb", "40", Some("S".into())));
        assert_eq!(component.len(), 2);
    }

    #[test]
    fn entries_without_a_tvdb_show_contribute_no_id_edges() {
        let graph = AnimeListsSource::new(vec![AnimeListEntry::new("31")]).build_id_graph();
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn builds_direct_episode_edges() {
        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let graph = sample().build_episode_graph(&meta, &id_graph);
        assert_eq!(graph.node_count(), 4);
        assert!(graph.has_edge(
            &EpisodeNode::new(Descriptor::new("anidb", "30", Some("R".into())), "1"),
            &EpisodeNode::new(Descriptor::new("tvdb_show", "99", Some("s1".into())), "1"),
        ));
    }
}
