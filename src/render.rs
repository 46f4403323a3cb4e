//! Rendering: project the episode graph into the canonical
//! `mappings.json` payload (spec.md §4.8, §6.2).
//!
//! `serde_json`'s `Map` is `BTreeMap`-backed without the `preserve_order`
//! feature (not enabled here, matching the teacher's `Cargo.toml`), so it
//! sorts keys byte-lexicographically — wrong for descriptors, where
//! `anilist:2` must sort before `anilist:10`. Rendering therefore builds
//! its own ordered tree and serializes it by hand, the same approach
//! `src/edits/yaml.rs` takes for the edits file rewrite.
//!
//! Grounded on `anibridge_mappings/utils/mapping.py::build_source_target_map`
//! and `anibridge_mappings/core/aggregator.py::build_schema_payload`.

use crate::descriptor::Descriptor;
use crate::graph::EpisodeGraph;
use crate::range::collapse::collapse;
use crate::range::parse_source_segment;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// `source_descriptor -> target_descriptor -> source_range -> {target_range}`,
/// built once per render/validation pass and shared between the two
/// (spec.md §4.5 "source_map ... cached once").
pub type SourceMap = HashMap<Descriptor, HashMap<Descriptor, HashMap<String, HashSet<String>>>>;

/// Every graph node is walked as a potential "source" against every
/// neighbor as a "target" — an undirected edge `(a,b)` therefore
/// contributes both `a->b` and `b->a` entries. Same-descriptor neighbors
/// (an entity linked to a different range label of itself) are not a
/// source/target pair and are skipped.
pub(crate) fn build_source_map(graph: &EpisodeGraph) -> SourceMap {
    let mut map: SourceMap = HashMap::new();
    for node in graph.nodes() {
        for neighbor in graph.neighbors(&node) {
            if node.descriptor == neighbor.descriptor {
                continue;
            }
            map.entry(node.descriptor.clone())
                .or_default()
                .entry(neighbor.descriptor.clone())
                .or_default()
                .entry(node.range_label.clone())
                .or_default()
                .insert(neighbor.range_label.clone());
        }
    }
    map
}

/// A fully-rendered, order-preserving document tree — the shape of
/// `mappings.json` before text serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub schema_version: String,
    pub generated_on: DateTime<Utc>,
    /// `(source_descriptor, [(target_descriptor, [(source_range, target_range)])])`
    /// in final canonical render order.
    pub entries: Vec<(Descriptor, Vec<(Descriptor, Vec<(String, String)>)>)>,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_pretty_json(&self) -> String {
        self.to_json_node().render(0, true)
    }

    pub fn to_compact_json(&self) -> String {
        self.to_json_node().render(0, false)
    }

    fn to_json_node(&self) -> JsonNode {
        let mut top = vec![(
            "$meta".to_string(),
            JsonNode::Object(vec![
                ("schema_version".to_string(), JsonNode::Str(self.schema_version.clone())),
                ("generated_on".to_string(), JsonNode::Str(render_timestamp(self.generated_on))),
            ]),
        )];
        for (source, targets) in &self.entries {
            let target_nodes = targets
                .iter()
                .map(|(target, ranges)| {
                    let range_nodes = ranges
                        .iter()
                        .map(|(k, v)| (k.clone(), JsonNode::Str(v.clone())))
                        .collect();
                    (target.to_string(), JsonNode::Object(range_nodes))
                })
                .collect();
            top.push((source.to_string(), JsonNode::Object(target_nodes)));
        }
        JsonNode::Object(top)
    }
}

/// ISO-8601 UTC with a trailing `Z` (spec.md §4.8), not `chrono`'s default
/// `+00:00` offset suffix.
pub(crate) fn render_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

enum JsonNode {
    Object(Vec<(String, JsonNode)>),
    Str(String),
}

impl JsonNode {
    fn render(&self, depth: usize, pretty: bool) -> String {
        let mut out = String::new();
        self.write(&mut out, depth, pretty);
        out
    }

    fn write(&self, out: &mut String, depth: usize, pretty: bool) {
        match self {
            JsonNode::Str(s) => out.push_str(&serde_json::to_string(s).expect("string serialization cannot fail")),
            JsonNode::Object(entries) => {
                if entries.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push('{');
                let child_indent = depth + 1;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if pretty {
                        out.push('\n');
                        out.push_str(&"  ".repeat(child_indent));
                    }
                    out.push_str(&serde_json::to_string(key).expect("string serialization cannot fail"));
                    out.push(':');
                    if pretty {
                        out.push(' ');
                    }
                    value.write(out, child_indent, pretty);
                    if idx + 1 < entries.len() {
                        out.push(',');
                    }
                }
                if pretty {
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth));
                }
                out.push('}');
            }
        }
    }
}

/// Sort key for range entries within one target block: `(start_of_source_
/// range, raw_key)`, invalid source range strings sorting last (spec.md
/// §4.8).
fn range_sort_key(raw_key: &str) -> (u8, u64, String) {
    match parse_source_segment(raw_key) {
        Ok(seg) => (0, seg.start, raw_key.to_string()),
        Err(_) => (1, u64::MAX, raw_key.to_string()),
    }
}

fn sort_ranges(collapsed: std::collections::BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = collapsed.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| range_sort_key(a).cmp(&range_sort_key(b)));
    entries
}

/// Project `graph` into the canonical payload (spec.md §4.8).
pub fn render_payload(graph: &EpisodeGraph, generated_on: DateTime<Utc>, schema_version: impl Into<String>) -> Payload {
    let source_map = build_source_map(graph);

    let mut sources: Vec<&Descriptor> = source_map.keys().collect();
    sources.sort_by_key(|d| d.sort_key());

    let mut entries = Vec::new();
    for source in sources {
        let targets_for_source = &source_map[source];
        let mut targets: Vec<&Descriptor> = targets_for_source.keys().collect();
        targets.sort_by_key(|d| d.sort_key());

        let mut rendered_targets = Vec::new();
        for target in targets {
            let collapsed = collapse(&targets_for_source[target]);
            if collapsed.is_empty() {
                continue;
            }
            rendered_targets.push((target.clone(), sort_ranges(collapsed)));
        }

        if !rendered_targets.is_empty() {
            entries.push((source.clone(), rendered_targets));
        }
    }

    Payload {
        schema_version: schema_version.into(),
        generated_on,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::episode::EpisodeNode;
    use crate::provenance::ProvenanceContext;
    use chrono::TimeZone;

    fn node(provider: &str, id: &str, scope: Option<&str>, range: &str) -> EpisodeNode {
        EpisodeNode::new(Descriptor::new(provider, id, scope.map(String::from)), range)
    }

    #[test]
    fn build_source_map_is_bidirectional_per_edge() {
        let mut graph = EpisodeGraph::new();
        let a = node("anilist", "12", None, "1-12");
        let b = node("tvdb_show", "99", Some("s1"), "1-12");
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(a.clone(), b.clone(), None);

        let map = build_source_map(&graph);
        assert!(map[&a.descriptor][&b.descriptor]["1-12"].contains("1-12"));
        assert!(map[&b.descriptor][&a.descriptor]["1-12"].contains("1-12"));
    }

    #[test]
    fn render_payload_omits_empty_target_scopes() {
        let graph = EpisodeGraph::new();
        let payload = render_payload(&graph, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "1.0.0");
        assert!(payload.is_empty());
    }

    #[test]
    fn render_payload_sorts_descriptors_numerically() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "10", None, "1"), node("mal", "10", None, "1"), None);
        graph.add_edge_with_provenance(node("anilist", "2", None, "1"), node("mal", "2", None, "1"), None);

        let payload = render_payload(&graph, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "1.0.0");
        let ids: Vec<&str> = payload.entries.iter().map(|(d, _)| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "10"]);
    }

    #[test]
    fn timestamp_renders_with_trailing_z() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(render_timestamp(ts), "2024-03-04T05:06:07Z");
    }

    #[test]
    fn meta_key_is_rendered_first() {
        let mut graph = EpisodeGraph::new();
        let _scope = graph.provenance_context_scope(ProvenanceContext::new("Source ingestion"));
        graph.add_edge_with_provenance(node("anilist", "1", None, "1-12"), node("mal", "1", None, "1-12"), None);
        let payload = render_payload(&graph, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "1.0.0");
        let json = payload.to_pretty_json();
        assert!(json.trim_start().starts_with("{\n  \"$meta\""));
    }
}
