//! Overlap validator (per target scope): for a fixed `(source, target)`,
//! flags any pair of target segments that overlap (spec.md §4.5).
//!
//! Grounded on `anibridge_mappings/core/validators.py::MappingOverlapValidator`.

use super::{ValidationContext, ValidationIssue, Validator};
use crate::range::{parse_segment, ranges_overlap};

pub struct OverlapTargetScopeValidator;

impl Validator for OverlapTargetScopeValidator {
    fn name(&self) -> &'static str {
        "overlap_target_scope"
    }

    fn validate(&self, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (source, targets) in &ctx.source_map {
            for (target, source_ranges) in targets {
                let mut seen: Vec<(u64, Option<u64>, String)> = Vec::new();

                let mut pairs: Vec<(&String, &String)> = Vec::new();
                for (source_range, target_ranges) in source_ranges {
                    for target_range in target_ranges {
                        pairs.push((source_range, target_range));
                    }
                }
                pairs.sort();

                for (source_range, target_range) in pairs {
                    let base = target_range.split('|').next().unwrap_or(target_range);
                    let Ok(seg) = parse_segment(base) else { continue };

                    for (prev_start, prev_end, prev_source_range) in &seen {
                        if ranges_overlap((seg.start, seg.end), (*prev_start, *prev_end)) {
                            issues.push(
                                ValidationIssue::new(self.name(), "Overlapping target episode ranges for the same target scope")
                                    .with_source(source.to_string())
                                    .with_target(target.to_string())
                                    .with_source_range(source_range.clone())
                                    .with_target_range(base.to_string())
                                    .with_detail("overlaps_with_source_range", prev_source_range.clone()),
                            );
                        }
                    }

                    seen.push((seg.start, seg.end, source_range.clone()));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use crate::graph::episode::EpisodeNode;
    use crate::graph::{EpisodeGraph, IdentifierGraph};
    use crate::meta::MetaStore;
    use crate::provenance::ProvenanceContext;

    fn node(provider: &str, id: &str, range: &str) -> EpisodeNode {
        EpisodeNode::new(Descriptor::without_scope(provider, id), range)
    }

    #[test]
    fn flags_overlapping_target_ranges() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", "1"), node("mal", "1", "1-5"), None);
        graph.add_edge_with_provenance(node("anilist", "1", "2"), node("mal", "1", "3-8"), None);

        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        let issues = OverlapTargetScopeValidator.validate(&ctx);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn disjoint_ranges_produce_no_issues() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", "1"), node("mal", "1", "1-5"), None);
        graph.add_edge_with_provenance(node("anilist", "1", "2"), node("mal", "1", "6-8"), None);

        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        assert!(OverlapTargetScopeValidator.validate(&ctx).is_empty());
    }
}
