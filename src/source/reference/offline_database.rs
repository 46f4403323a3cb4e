//! In-tree fixture counterpart to `anime_offline_database.py`: instead of
//! fetching and decompressing the upstream zstd-compressed dataset, it
//! walks a small embedded table of entries with the same shape (a list
//! of provider source URLs, a type string, an episode count, a season
//! year).

use crate::descriptor::Descriptor;
use crate::graph::IdentifierGraph;
use crate::meta::{MetaStore, SourceMeta, SourceType};
use crate::source::{IdSource, MetaSource, Source, SourceError};
use async_trait::async_trait;

const SOURCE_PREFIXES: [(&str, &str); 3] = [
    ("anidb", "https://anidb.net/anime/"),
    ("anilist", "https://anilist.co/anime/"),
    ("mal", "https://myanimelist.net/anime/"),
];

fn parse_source_url(url: &str) -> Option<Descriptor> {
    for (provider, prefix) in SOURCE_PREFIXES {
        if let Some(id) = url.strip_prefix(prefix) {
            if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                let scope = if provider == "anidb" { Some("s1".to_string()) } else { None };
                return Some(Descriptor::new(provider, id, scope));
            }
        }
    }
    None
}

fn parse_kind(kind: &str) -> Option<SourceType> {
    match kind.to_ascii_lowercase().as_str() {
        "movie" => Some(SourceType::Movie),
        "tv" | "ova" | "ona" | "special" | "music" => Some(SourceType::Tv),
        _ => None,
    }
}

/// One dataset row: a title's cross-provider source URLs plus its type,
/// episode count, and season year.
#[derive(Debug, Clone)]
pub struct OfflineDatabaseEntry {
    pub sources: Vec<String>,
    pub kind: String,
    pub episodes: Option<u32>,
    pub start_year: Option<u32>,
}

impl OfflineDatabaseEntry {
    pub fn new(sources: impl IntoIterator<Item = impl Into<String>>, kind: impl Into<String>) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            kind: kind.into(),
            episodes: None,
            start_year: None,
        }
    }

    pub fn with_episodes(mut self, episodes: u32) -> Self {
        self.episodes = Some(episodes);
        self
    }

    pub fn with_start_year(mut self, year: u32) -> Self {
        self.start_year = Some(year);
        self
    }
}

/// Identifier and metadata source backed by an embedded fixture table.
pub struct OfflineDatabaseSource {
    entries: Vec<OfflineDatabaseEntry>,
}

impl OfflineDatabaseSource {
    pub fn new(entries: Vec<OfflineDatabaseEntry>) -> Self {
        Self { entries }
    }

    fn provider_descriptors(entry: &OfflineDatabaseEntry) -> Vec<Descriptor> {
        entry.sources.iter().filter_map(|s| parse_source_url(s)).collect()
    }
}

#[async_trait]
impl Source for OfflineDatabaseSource {
    fn name(&self) -> &str {
        "offline_database"
    }
}

impl IdSource for OfflineDatabaseSource {
    fn build_id_graph(&self) -> IdentifierGraph {
        let mut graph = IdentifierGraph::new();
        for entry in &self.entries {
            let descriptors = Self::provider_descriptors(entry);
            if descriptors.len() >= 2 {
                graph.add_equivalence_class(descriptors);
            }
        }
        graph
    }
}

#[async_trait]
impl MetaSource for OfflineDatabaseSource {
    async fn collect_metadata(&self, _id_graph: &IdentifierGraph) -> MetaStore {
        let mut store = MetaStore::new();
        for entry in &self.entries {
            let descriptors = Self::provider_descriptors(entry);
            if descriptors.is_empty() {
                continue;
            }
            let kind = parse_kind(&entry.kind);
            for descriptor in descriptors {
                store.set(
                    descriptor,
                    SourceMeta {
                        kind,
                        episodes: entry.episodes,
                        duration: None,
                        start_year: entry.start_year,
                    },
                );
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OfflineDatabaseSource {
        OfflineDatabaseSource::new(vec![
            OfflineDatabaseEntry::new(
                ["https://anidb.net/anime/30", "https://anilist.co/anime/100", "https://myanimelist.net/anime/200"],
                "TV",
            )
            .with_episodes(12)
            .with_start_year(2019),
            OfflineDatabaseEntry::new(["https://myanimelist.net/anime/201"], "Movie").with_episodes(1),
        ])
    }

    #[test]
    fn links_entries_with_two_or_more_providers() {
        let graph = sample().build_id_graph();
        let component = graph.connected_component(&Descriptor::without_scope("anilist", "100"));
        assert_eq!(component.len(), 3);
    }

    #[test]
    fn single_provider_entries_are_not_graphed() {
        let graph = sample().build_id_graph();
        assert!(!graph.contains_node(&Descriptor::without_scope("mal", "201")));
    }

    #[tokio::test]
    async fn metadata_picks_up_kind_episodes_and_year() {
        let id_graph = IdentifierGraph::new();
        let store = sample().collect_metadata(&id_graph).await;
        let meta = store.get(&Descriptor::new("anidb", "30", Some("s1".to_string()))).unwrap();
        assert_eq!(meta.kind, Some(SourceType::Tv));
        assert_eq!(meta.episodes, Some(12));
        assert_eq!(meta.start_year, Some(2019));
    }
}
