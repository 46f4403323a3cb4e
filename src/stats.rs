//! Stats document: provider coverage and validator-issue counts derived
//! from a completed pipeline run (spec.md §6.5).
//!
//! Grounded on `anibridge_mappings/core/stats.py::build_stats`. Unlike
//! the rendered mappings payload, the stats document has no determinism
//! requirement in spec.md, so it's built with plain `serde_json::Value`
//! maps rather than the hand-rolled ordered tree in `render.rs`.

use crate::aggregator::Artifacts;
use crate::graph::{EpisodeGraph, IdentifierGraph};
use crate::render::{render_timestamp, Payload};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

/// Sum of per-node neighbor-list lengths — double the unique edge count
/// for an undirected graph. Kept exactly as the original computes it
/// (`_count_edges`) rather than "fixed" to a true edge count.
fn count_links(node_count_neighbors: impl Iterator<Item = usize>) -> usize {
    node_count_neighbors.sum()
}

fn id_graph_links(graph: &IdentifierGraph) -> usize {
    count_links(graph.nodes().iter().map(|n| graph.neighbors(n).len()))
}

fn episode_graph_links(graph: &EpisodeGraph) -> usize {
    count_links(graph.nodes().iter().map(|n| graph.neighbors(n).len()))
}

/// Build the stats document for a completed run's `artifacts` and its
/// already-rendered `payload`.
pub fn build_stats(artifacts: &Artifacts, payload: &Payload) -> Value {
    let mut descriptor_sets: HashMap<String, HashSet<(String, Option<String>)>> = HashMap::new();
    let mut id_sets: HashMap<String, HashSet<String>> = HashMap::new();
    let mut scope_sets: HashMap<String, HashSet<Option<String>>> = HashMap::new();
    let mut source_descriptor_sets: HashMap<String, HashSet<String>> = HashMap::new();
    let mut target_descriptor_sets: HashMap<String, HashSet<String>> = HashMap::new();
    let mut source_range_counts: HashMap<String, u64> = HashMap::new();
    let mut target_range_counts: HashMap<String, u64> = HashMap::new();
    let mut source_ranges_total = 0u64;
    let mut target_ranges_total = 0u64;
    let mut descriptor_union: HashSet<String> = HashSet::new();

    for (source, targets) in &payload.entries {
        descriptor_union.insert(source.to_string());
        descriptor_sets
            .entry(source.provider.clone())
            .or_default()
            .insert((source.id.clone(), source.scope.clone()));
        id_sets.entry(source.provider.clone()).or_default().insert(source.id.clone());
        scope_sets.entry(source.provider.clone()).or_default().insert(source.scope.clone());
        source_descriptor_sets
            .entry(source.provider.clone())
            .or_default()
            .insert(source.to_string());

        for (target, ranges) in targets {
            descriptor_union.insert(target.to_string());
            descriptor_sets
                .entry(target.provider.clone())
                .or_default()
                .insert((target.id.clone(), target.scope.clone()));
            id_sets.entry(target.provider.clone()).or_default().insert(target.id.clone());
            scope_sets.entry(target.provider.clone()).or_default().insert(target.scope.clone());
            target_descriptor_sets
                .entry(target.provider.clone())
                .or_default()
                .insert(target.to_string());

            let source_range_units = ranges.len() as u64;
            *source_range_counts.entry(source.provider.clone()).or_insert(0) += source_range_units;
            source_ranges_total += source_range_units;

            for (_source_range, target_spec) in ranges {
                let segments = target_spec.split(',').map(str::trim).filter(|s| !s.is_empty()).count() as u64;
                *target_range_counts.entry(target.provider.clone()).or_insert(0) += segments;
                target_ranges_total += segments;
            }
        }
    }

    let mut providers: HashSet<&String> = HashSet::new();
    providers.extend(descriptor_sets.keys());
    providers.extend(id_sets.keys());
    providers.extend(scope_sets.keys());
    providers.extend(source_range_counts.keys());
    providers.extend(target_range_counts.keys());
    providers.extend(source_descriptor_sets.keys());
    providers.extend(target_descriptor_sets.keys());

    let mut sorted_providers: Vec<&String> = providers.into_iter().collect();
    sorted_providers.sort();

    let mut provider_stats = Map::new();
    for provider in &sorted_providers {
        provider_stats.insert(
            (*provider).clone(),
            json!({
                "distinct_descriptors": descriptor_sets.get(*provider).map(|s| s.len()).unwrap_or(0),
                "distinct_ids": id_sets.get(*provider).map(|s| s.len()).unwrap_or(0),
                "distinct_scopes": scope_sets.get(*provider).map(|s| s.len()).unwrap_or(0),
                "source_range_units": source_range_counts.get(*provider).copied().unwrap_or(0),
                "target_range_units": target_range_counts.get(*provider).copied().unwrap_or(0),
            }),
        );
    }

    let mut validator_counts: HashMap<&'static str, u64> = HashMap::new();
    let mut source_provider_counts: HashMap<String, u64> = HashMap::new();
    let mut target_provider_counts: HashMap<String, u64> = HashMap::new();
    let mut distinct_sources: HashSet<&str> = HashSet::new();
    let mut distinct_targets: HashSet<&str> = HashSet::new();

    for issue in &artifacts.validation_issues {
        *validator_counts.entry(issue.validator).or_insert(0) += 1;
        if let Some(source) = &issue.source {
            distinct_sources.insert(source.as_str());
            if let Some(provider) = source.split(':').next() {
                *source_provider_counts.entry(provider.to_string()).or_insert(0) += 1;
            }
        }
        if let Some(target) = &issue.target {
            distinct_targets.insert(target.as_str());
            if let Some(provider) = target.split(':').next() {
                *target_provider_counts.entry(provider.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut sorted_validator_counts: Vec<(&str, u64)> = validator_counts.into_iter().collect();
    sorted_validator_counts.sort();
    let mut sorted_source_provider_counts: Vec<(String, u64)> = source_provider_counts.into_iter().collect();
    sorted_source_provider_counts.sort();
    let mut sorted_target_provider_counts: Vec<(String, u64)> = target_provider_counts.into_iter().collect();
    sorted_target_provider_counts.sort();

    json!({
        "meta": {
            "schema_version": payload.schema_version,
            "generated_on": render_timestamp(payload.generated_on),
        },
        "summary": {
            "providers": provider_stats.len(),
            "distinct_descriptors": descriptor_union.len(),
            "source_range_units": source_ranges_total,
            "target_range_units": target_ranges_total,
            "validation_issues": artifacts.validation_issues.len(),
        },
        "providers": provider_stats,
        "validator": {
            "total_issues": artifacts.validation_issues.len(),
            "by_validator": Map::from_iter(sorted_validator_counts.into_iter().map(|(k, v)| (k.to_string(), Value::from(v)))),
            "by_source_provider": Map::from_iter(sorted_source_provider_counts.into_iter().map(|(k, v)| (k, Value::from(v)))),
            "by_target_provider": Map::from_iter(sorted_target_provider_counts.into_iter().map(|(k, v)| (k, Value::from(v)))),
            "distinct_sources": distinct_sources.len(),
            "distinct_targets": distinct_targets.len(),
        },
        "internal": {
            "episode_graph_nodes": artifacts.episode_graph.node_count(),
            "episode_graph_edges": episode_graph_links(&artifacts.episode_graph),
            "id_graph_nodes": artifacts.id_graph.node_count(),
            "id_graph_edges": id_graph_links(&artifacts.id_graph),
            "meta_entries": artifacts.meta_store.len(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use crate::meta::MetaStore;
    use chrono::{TimeZone, Utc};

    #[test]
    fn stats_count_descriptors_and_range_units() {
        let artifacts = Artifacts {
            id_graph: IdentifierGraph::new(),
            meta_store: MetaStore::new(),
            episode_graph: EpisodeGraph::new(),
            validation_issues: vec![],
        };
        let payload = Payload {
            schema_version: "1.0.0".into(),
            generated_on: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            entries: vec![(
                Descriptor::without_scope("anilist", "1"),
                vec![(
                    Descriptor::without_scope("mal", "1"),
                    vec![("1-5".to_string(), "1-5,7-9".to_string())],
                )],
            )],
        };

        let stats = build_stats(&artifacts, &payload);
        assert_eq!(stats["summary"]["distinct_descriptors"], 2);
        assert_eq!(stats["summary"]["source_range_units"], 1);
        assert_eq!(stats["summary"]["target_range_units"], 2);
        assert_eq!(stats["providers"]["anilist"]["distinct_ids"], 1);
    }
}
