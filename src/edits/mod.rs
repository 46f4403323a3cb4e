//! Edit overlay: curated, replace-semantics document that overrides
//! machine-derived mappings (spec.md §4.6).
//!
//! Grounded on `anibridge_mappings/core/edits.py` (`apply_edits`,
//! `_build_scope_index`, `_apply_replace`, `_clear_source_target_ranges`).

pub mod yaml;

use crate::descriptor::Descriptor;
use crate::graph::episode::EpisodeNode;
use crate::graph::EpisodeGraph;
use crate::provenance::ProvenanceContext;
use crate::range::{parse_source_segment, parse_target_spec};
use std::collections::{HashMap, HashSet};

/// Parsed `mappings.edits.yaml` body: ordered source descriptors, each with
/// ordered target descriptors, each with ordered source-range -> target-
/// range pairs. Keys starting with `$` are stripped during parsing — they
/// are metadata-only (spec.md §4.6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditsDocument {
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub source: String,
    pub targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub target: String,
    pub ranges: Vec<(String, String)>,
}

impl EditsDocument {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Errors that abort the whole overlay step (spec.md §7 "Edit error").
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("invalid descriptor '{0}' in edits document")]
    InvalidDescriptor(String),
    #[error("duplicate target '{target}' under source '{source}' in edits document")]
    DuplicateTarget { source: String, target: String },
    #[error("invalid range '{0}' in edits document")]
    InvalidRange(String),
    #[error("failed to parse edits YAML: {0}")]
    Yaml(String),
    #[error("failed to read edits file '{path}': {message}")]
    Io { path: String, message: String },
}

/// Apply the edits document to `graph`, replacing every edge between each
/// named `(source_descriptor, target_descriptor)` pair with the pairs the
/// document supplies (spec.md §4.6). Returns the set of source descriptors
/// touched. Aborts (leaving the graph partially edited, matching the
/// original's abort-on-first-error semantics) on the first invalid
/// descriptor, invalid range, or duplicate target.
pub fn apply_edits(graph: &mut EpisodeGraph, edits: &EditsDocument) -> Result<HashSet<Descriptor>, EditError> {
    let mut scope_index = build_scope_index(graph);
    let mut edited_scopes = HashSet::new();

    for entry in &edits.sources {
        if entry.source.starts_with('$') {
            continue;
        }
        let source = Descriptor::parse(&entry.source).map_err(|_| EditError::InvalidDescriptor(entry.source.clone()))?;

        let mut processed_targets: HashSet<&str> = HashSet::new();
        for target_entry in &entry.targets {
            if target_entry.target.starts_with('$') {
                continue;
            }
            if !processed_targets.insert(&target_entry.target) {
                return Err(EditError::DuplicateTarget {
                    source: entry.source.clone(),
                    target: target_entry.target.clone(),
                });
            }
            let target = Descriptor::parse(&target_entry.target)
                .map_err(|_| EditError::InvalidDescriptor(target_entry.target.clone()))?;

            apply_replace(graph, &source, &target, &target_entry.ranges, &mut scope_index)?;
        }

        edited_scopes.insert(source);
    }

    Ok(edited_scopes)
}

/// Index every current episode node by its owning descriptor (spec.md
/// §4.6 "A scope index ... is built once from the current graph").
fn build_scope_index(graph: &EpisodeGraph) -> HashMap<Descriptor, HashSet<EpisodeNode>> {
    let mut index: HashMap<Descriptor, HashSet<EpisodeNode>> = HashMap::new();
    for node in graph.nodes() {
        index.entry(node.descriptor.clone()).or_default().insert(node);
    }
    index
}

fn clear_source_target_ranges(
    graph: &mut EpisodeGraph,
    source_nodes: &HashSet<EpisodeNode>,
    target_nodes: &HashSet<EpisodeNode>,
) {
    if source_nodes.is_empty() || target_nodes.is_empty() {
        return;
    }
    let ctx = ProvenanceContext::new("Manual overrides: clear prior");
    for src_node in source_nodes {
        for neighbor in graph.neighbors(src_node) {
            if target_nodes.contains(&neighbor) {
                graph.remove_edge_with_provenance(src_node, &neighbor, Some(ctx.clone()));
            }
        }
    }
}

fn apply_replace(
    graph: &mut EpisodeGraph,
    source: &Descriptor,
    target: &Descriptor,
    ranges: &[(String, String)],
    scope_index: &mut HashMap<Descriptor, HashSet<EpisodeNode>>,
) -> Result<(), EditError> {
    for (src_range, tgt_range) in ranges {
        parse_source_segment(src_range).map_err(|_| EditError::InvalidRange(src_range.clone()))?;
        parse_target_spec(tgt_range).map_err(|_| EditError::InvalidRange(tgt_range.clone()))?;
    }

    let source_nodes = scope_index.get(source).cloned().unwrap_or_default();
    let target_nodes = scope_index.get(target).cloned().unwrap_or_default();
    clear_source_target_ranges(graph, &source_nodes, &target_nodes);

    if ranges.is_empty() {
        return Ok(());
    }

    let ctx = ProvenanceContext::new("Manual overrides: add replacement");
    for (src_range, tgt_range) in ranges {
        let src_node = EpisodeNode::new(source.clone(), src_range.clone());
        let tgt_node = EpisodeNode::new(target.clone(), tgt_range.clone());
        graph.add_edge_with_provenance(src_node.clone(), tgt_node.clone(), Some(ctx.clone()));
        scope_index.entry(source.clone()).or_default().insert(src_node);
        scope_index.entry(target.clone()).or_default().insert(tgt_node);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(provider: &str, id: &str, range: &str) -> EpisodeNode {
        EpisodeNode::new(Descriptor::without_scope(provider, id), range)
    }

    #[test]
    fn overlay_replaces_prior_edges() {
        let mut graph = EpisodeGraph::new();
        {
            let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
            graph.add_edge_with_provenance(node("anilist", "9", "1-12"), node("tvdb_show", "9", "1-12"), None);
        }

        let edits = EditsDocument {
            sources: vec![SourceEntry {
                source: "anilist:9".into(),
                targets: vec![TargetEntry {
                    target: "tvdb_show:9".into(),
                    ranges: vec![("1-2".into(), "1-2".into())],
                }],
            }],
        };

        apply_edits(&mut graph, &edits).unwrap();

        assert!(!graph.has_edge(&node("anilist", "9", "1-12"), &node("tvdb_show", "9", "1-12")));
        assert!(graph.has_edge(&node("anilist", "9", "1-2"), &node("tvdb_show", "9", "1-2")));
    }

    #[test]
    fn empty_body_clears_without_adding() {
        let mut graph = EpisodeGraph::new();
        {
            let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
            graph.add_edge_with_provenance(node("anilist", "1", "1-12"), node("tvdb_show", "1", "1-12"), None);
        }

        let edits = EditsDocument {
            sources: vec![SourceEntry {
                source: "anilist:1".into(),
                targets: vec![TargetEntry {
                    target: "tvdb_show:1".into(),
                    ranges: vec![],
                }],
            }],
        };
        apply_edits(&mut graph, &edits).unwrap();
        assert!(!graph.has_edge(&node("anilist", "1", "1-12"), &node("tvdb_show", "1", "1-12")));
    }

    #[test]
    fn duplicate_target_is_rejected() {
        let mut graph = EpisodeGraph::new();
        let edits = EditsDocument {
            sources: vec![SourceEntry {
                source: "anilist:1".into(),
                targets: vec![
                    TargetEntry {
                        target: "tvdb_show:1".into(),
                        ranges: vec![],
                    },
                    TargetEntry {
                        target: "tvdb_show:1".into(),
                        ranges: vec![],
                    },
                ],
            }],
        };
        assert!(matches!(apply_edits(&mut graph, &edits), Err(EditError::DuplicateTarget { .. })));
    }

    #[test]
    fn invalid_descriptor_aborts() {
        let mut graph = EpisodeGraph::new();
        let edits = EditsDocument {
            sources: vec![SourceEntry {
                source: "not-a-descriptor".into(),
                targets: vec![],
            }],
        };
        assert!(matches!(apply_edits(&mut graph, &edits), Err(EditError::InvalidDescriptor(_))));
    }

    #[test]
    fn invalid_range_aborts() {
        let mut graph = EpisodeGraph::new();
        let edits = EditsDocument {
            sources: vec![SourceEntry {
                source: "anilist:1".into(),
                targets: vec![TargetEntry {
                    target: "tvdb_show:1".into(),
                    ranges: vec![("not-a-range".into(), "1-2".into())],
                }],
            }],
        };
        assert!(matches!(apply_edits(&mut graph, &edits), Err(EditError::InvalidRange(_))));
    }

    #[test]
    fn metadata_only_keys_are_ignored() {
        let mut graph = EpisodeGraph::new();
        let edits = EditsDocument {
            sources: vec![SourceEntry {
                source: "$schema".into(),
                targets: vec![],
            }],
        };
        let scopes = apply_edits(&mut graph, &edits).unwrap();
        assert!(scopes.is_empty());
    }
}
