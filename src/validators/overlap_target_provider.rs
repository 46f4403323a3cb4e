//! Overlap validator (per target provider, across target scopes): for a
//! fixed source, flags overlapping *source* ranges that hit different
//! target scopes of the same provider (spec.md §4.5). No original
//! counterpart — the retrieved Python only validates per-target-scope
//! overlap; this generalizes the same technique across scopes.

use super::{ValidationContext, ValidationIssue, Validator};
use crate::descriptor::Descriptor;
use crate::range::{parse_source_segment, ranges_overlap};
use std::collections::HashMap;

pub struct OverlapTargetProviderValidator;

impl Validator for OverlapTargetProviderValidator {
    fn name(&self) -> &'static str {
        "overlap_target_provider"
    }

    fn validate(&self, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (source, targets) in &ctx.source_map {
            let mut by_provider: HashMap<&str, Vec<(&Descriptor, &String)>> = HashMap::new();
            for (target, source_ranges) in targets {
                for source_range in source_ranges.keys() {
                    by_provider.entry(target.provider.as_str()).or_default().push((target, source_range));
                }
            }

            for mut entries in by_provider.into_values() {
                entries.sort_by(|a, b| a.1.cmp(b.1));
                let mut seen: Vec<(u64, Option<u64>, &Descriptor, &String)> = Vec::new();

                for (target, source_range) in entries {
                    let Ok(seg) = parse_source_segment(source_range) else { continue };

                    for (prev_start, prev_end, prev_target, prev_range) in &seen {
                        if *prev_target == target {
                            continue;
                        }
                        if ranges_overlap((seg.start, seg.end), (*prev_start, *prev_end)) {
                            issues.push(
                                ValidationIssue::new(self.name(), "Overlapping source ranges claimed by different target scopes of the same provider")
                                    .with_source(source.to_string())
                                    .with_target(target.to_string())
                                    .with_source_range(source_range.clone())
                                    .with_detail("overlaps_with_target", prev_target.to_string())
                                    .with_detail("overlaps_with_source_range", (*prev_range).clone()),
                            );
                        }
                    }

                    seen.push((seg.start, seg.end, target, source_range));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::episode::EpisodeNode;
    use crate::graph::{EpisodeGraph, IdentifierGraph};
    use crate::meta::MetaStore;
    use crate::provenance::ProvenanceContext;

    fn node(provider: &str, id: &str, scope: Option<&str>, range: &str) -> EpisodeNode {
        EpisodeNode::new(Descriptor::new(provider, id, scope.map(String::from)), range)
    }

    #[test]
    fn flags_overlap_across_scopes_of_same_provider() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", None, "1-5"), node("tvdb_show", "9", Some("s1"), "1-5"), None);
        graph.add_edge_with_provenance(node("anilist", "1", None, "3-8"), node("tvdb_show", "9", Some("s2"), "1-6"), None);

        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        let issues = OverlapTargetProviderValidator.validate(&ctx);
        assert!(!issues.is_empty());
    }

    #[test]
    fn same_target_is_not_double_flagged() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", None, "1-5"), node("tvdb_show", "9", Some("s1"), "1-5"), None);
        graph.add_edge_with_provenance(node("anilist", "1", None, "3-8"), node("tvdb_show", "9", Some("s1"), "1-6"), None);

        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        assert!(OverlapTargetProviderValidator.validate(&ctx).is_empty());
    }
}
