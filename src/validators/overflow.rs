//! Overflow validator: flags target ranges beyond the target's known
//! episode count (spec.md §4.5).
//!
//! Grounded on `anibridge_mappings/core/validators.py::MappingOverflowValidator`.

use super::{ValidationContext, ValidationIssue, Validator};
use crate::range::parse_segment;

pub struct OverflowValidator;

impl Validator for OverflowValidator {
    fn name(&self) -> &'static str {
        "overflow"
    }

    fn validate(&self, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (source, targets) in &ctx.source_map {
            for (target, source_ranges) in targets {
                let Some(limit) = ctx.meta_store.get(target).and_then(|m| m.effective_episodes()) else {
                    continue;
                };

                for (source_range, target_ranges) in source_ranges {
                    for target_range in target_ranges {
                        let base = target_range.split('|').next().unwrap_or(target_range);
                        let Ok(seg) = parse_segment(base) else { continue };

                        let overflows = match seg.end {
                            None => seg.start > limit as u64,
                            Some(end) => end > limit as u64,
                        };

                        if overflows {
                            issues.push(
                                ValidationIssue::new(self.name(), "Target mapping exceeds available episodes")
                                    .with_source(source.to_string())
                                    .with_target(target.to_string())
                                    .with_source_range(source_range.clone())
                                    .with_target_range(base.to_string())
                                    .with_detail("episode_limit", limit),
                            );
                        }
                    }
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
    use crate::meta::{MetaStore, SourceMeta, SourceType};
    use crate::provenance::ProvenanceContext;

    fn node(provider: &str, id: &str, scope: Option<&str>, range: &str) -> EpisodeNode {
        EpisodeNode::new(Descriptor::new(provider, id, scope.map(String::from)), range)
    }

    #[test]
    fn flags_target_range_past_episode_limit() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        let target = node("tvdb_show", "200", Some("s1"), "1-12");
        graph.add_edge_with_provenance(node("anidb", "1", Some("R"), "1-12"), target.clone(), None);

        let mut meta = MetaStore::new();
        meta.set(
            target.descriptor.clone(),
            SourceMeta {
                kind: Some(SourceType::Tv),
                episodes: Some(10),
                duration: None,
                start_year: None,
            },
        );

        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        let issues = OverflowValidator.validate(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].target_range.as_deref(), Some("1-12"));
    }

    #[test]
    fn within_limit_produces_no_issue() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        let target = node("tvdb_show", "100", Some("s1"), "1-5");
        graph.add_edge_with_provenance(node("anidb", "5", Some("R"), "1-5"), target.clone(), None);

        let mut meta = MetaStore::new();
        meta.set(
            target.descriptor.clone(),
            SourceMeta {
                kind: Some(SourceType::Tv),
                episodes: Some(13),
                duration: None,
                start_year: None,
            },
        );

        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        assert!(OverflowValidator.validate(&ctx).is_empty());
    }
}
