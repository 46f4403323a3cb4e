//! Range syntax validator: rejects source ranges containing `,` and any
//! unparseable source/target segment (spec.md §4.5).

use super::{ValidationContext, ValidationIssue, Validator};
use crate::range::{parse_segment, parse_source_segment};

pub struct RangeSyntaxValidator;

impl Validator for RangeSyntaxValidator {
    fn name(&self) -> &'static str {
        "range_syntax"
    }

    fn validate(&self, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (source, targets) in &ctx.source_map {
            for (target, source_ranges) in targets {
                for (source_range, target_ranges) in source_ranges {
                    if parse_source_segment(source_range).is_err() {
                        issues.push(
                            ValidationIssue::new(self.name(), "Invalid source range syntax")
                                .with_source(source.to_string())
                                .with_target(target.to_string())
                                .with_source_range(source_range.clone()),
                        );
                        continue;
                    }
                    for target_range in target_ranges {
                        if parse_segment(target_range).is_err() {
                            issues.push(
                                ValidationIssue::new(self.name(), "Invalid target range syntax")
                                    .with_source(source.to_string())
                                    .with_target(target.to_string())
                                    .with_source_range(source_range.clone())
                                    .with_target_range(target_range.clone()),
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
    use crate::meta::MetaStore;
    use crate::provenance::ProvenanceContext;

    fn node(provider: &str, id: &str, range: &str) -> EpisodeNode {
        EpisodeNode::new(Descriptor::without_scope(provider, id), range)
    }

    #[test]
    fn flags_comma_source_range() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", "1,2"), node("mal", "1", "1"), None);

        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        let issues = RangeSyntaxValidator.validate(&ctx);
        assert!(issues.iter().any(|i| i.source_range.as_deref() == Some("1,2")));
    }

    #[test]
    fn valid_ranges_produce_no_issues() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", "1-5"), node("mal", "1", "1-5"), None);

        let meta = MetaStore::new();
        let id_graph = IdentifierGraph::new();
        let ctx = ValidationContext::new(&graph, &meta, &id_graph);
        assert!(RangeSyntaxValidator.validate(&ctx).is_empty());
    }
}
