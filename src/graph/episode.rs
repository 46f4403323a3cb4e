//! Episode-range graph: `(descriptor, range_label)` nodes asserting
//! episode-level correspondence, with every mutation provenance-stamped.
//!
//! Grounded on `anibridge_mappings/core/graph.py::EpisodeMappingGraph`.

use super::base::AdjacencyGraph;
use crate::descriptor::Descriptor;
use crate::provenance::{resolve, ProvenanceAction, ProvenanceContext, ProvenanceEvent, ProvenanceLog, ProvenanceScope};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::HashSet;

/// `(descriptor, range_label)` — a node in the episode graph (spec.md §3
/// "Episode node"). `range_label` is the rendered range string (I4: two
/// labels differing only in whitespace are distinct nodes — callers must
/// normalize before constructing one).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeNode {
    pub descriptor: Descriptor,
    pub range_label: String,
}

impl EpisodeNode {
    pub fn new(descriptor: Descriptor, range_label: impl Into<String>) -> Self {
        Self {
            descriptor,
            range_label: range_label.into(),
        }
    }
}

/// Plain lexicographic ordering over `(provider, id, scope_or_empty,
/// range_label)` (spec.md §4.1).
impl Ord for EpisodeNode {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |n: &EpisodeNode| {
            (
                n.descriptor.provider.clone(),
                n.descriptor.id.clone(),
                n.descriptor.scope.clone().unwrap_or_default(),
                n.range_label.clone(),
            )
        };
        key(self).cmp(&key(other))
    }
}

impl PartialOrd for EpisodeNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Undirected, provenance-tracked graph over episode nodes (spec.md
/// §4.1, §4.7).
#[derive(Debug, Default)]
pub struct EpisodeGraph {
    inner: AdjacencyGraph<EpisodeNode>,
    log: ProvenanceLog<EpisodeNode>,
    default_context: Option<ProvenanceContext>,
}

impl EpisodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn contains_node(&self, node: &EpisodeNode) -> bool {
        self.inner.contains_node(node)
    }

    pub fn has_edge(&self, a: &EpisodeNode, b: &EpisodeNode) -> bool {
        self.inner.has_edge(a, b)
    }

    pub fn neighbors(&self, node: &EpisodeNode) -> Vec<EpisodeNode> {
        self.inner.neighbors(node)
    }

    pub fn nodes(&self) -> Vec<EpisodeNode> {
        self.inner.nodes()
    }

    pub fn connected_component(&self, start: &EpisodeNode) -> Vec<EpisodeNode> {
        self.inner.connected_component(start)
    }

    pub fn component_grouped_by_provider(&self, start: &EpisodeNode) -> HashMap<String, Vec<EpisodeNode>> {
        let mut grouped: HashMap<String, Vec<EpisodeNode>> = HashMap::new();
        for node in self.inner.connected_component(start) {
            grouped.entry(node.descriptor.provider.clone()).or_default().push(node);
        }
        grouped
    }

    /// All connected components, each in canonical node order.
    pub fn components(&self) -> Vec<Vec<EpisodeNode>> {
        let mut seen: HashSet<EpisodeNode> = HashSet::new();
        let mut components = Vec::new();
        for node in self.inner.nodes() {
            if seen.contains(&node) {
                continue;
            }
            let component = self.inner.connected_component(&node);
            for member in &component {
                seen.insert(member.clone());
            }
            components.push(component);
        }
        components
    }

    /// All unique undirected edges in canonical order (spec.md §4.1
    /// `iter_unique_edges`).
    pub fn iter_unique_edges(&self) -> Vec<(EpisodeNode, EpisodeNode)> {
        self.inner.iter_unique_edges()
    }

    /// Install `ctx` as the scoped default provenance context for the
    /// duration of the returned guard; restored to the previous value on
    /// drop (spec.md §4.7, Design Notes §9).
    pub fn provenance_context_scope(&mut self, ctx: ProvenanceContext) -> ProvenanceScope<'_> {
        ProvenanceScope::new(&mut self.default_context, ctx)
    }

    /// Add an undirected edge, stamping a provenance event. `ctx`
    /// overrides the scoped default field-by-field; details are merged
    /// with `ctx` winning on key conflict (spec.md §4.7). Returns
    /// whether the edge newly changed graph state.
    pub fn add_edge_with_provenance(
        &mut self,
        a: EpisodeNode,
        b: EpisodeNode,
        ctx: Option<ProvenanceContext>,
    ) -> bool {
        let effective = self.inner.add_edge(a.clone(), b.clone());
        let resolved = resolve(self.default_context.as_ref(), ctx.as_ref());
        self.log.record(&a, &b, ProvenanceAction::Add, resolved, effective);
        effective
    }

    /// Remove an undirected edge, stamping a provenance event. Returns
    /// whether the edge was actually present.
    pub fn remove_edge_with_provenance(
        &mut self,
        a: &EpisodeNode,
        b: &EpisodeNode,
        ctx: Option<ProvenanceContext>,
    ) -> bool {
        let effective = self.inner.remove_edge(a, b);
        let resolved = resolve(self.default_context.as_ref(), ctx.as_ref());
        self.log.record(a, b, ProvenanceAction::Remove, resolved, effective);
        effective
    }

    /// Within each connected component, add direct edges between every
    /// node pair lacking one, skipping any node whose `range_label`
    /// contains `,` or `|` (spec.md §4.3 step 8, §9 "possibly-buggy,
    /// preserve"). Returns the number of edges actually added.
    pub fn add_transitive_edges(&mut self, ctx: Option<ProvenanceContext>) -> usize {
        let mut added = 0;
        for component in self.components() {
            let eligible: Vec<EpisodeNode> = component
                .into_iter()
                .filter(|n| !n.range_label.contains(',') && !n.range_label.contains('|'))
                .collect();
            for i in 0..eligible.len() {
                for j in (i + 1)..eligible.len() {
                    let a = eligible[i].clone();
                    let b = eligible[j].clone();
                    if !self.inner.has_edge(&a, &b) && self.add_edge_with_provenance(a, b, ctx.clone()) {
                        added += 1;
                    }
                }
            }
        }
        added
    }

    /// Provenance history sorted by canonical edge order, events within
    /// each edge in original `seq` order.
    pub fn provenance_history(&self) -> Vec<(EpisodeNode, EpisodeNode, &[ProvenanceEvent])> {
        self.log.history()
    }

    pub fn events_for(&self, a: &EpisodeNode, b: &EpisodeNode) -> &[ProvenanceEvent] {
        self.log.events_for(a, b)
    }
}
