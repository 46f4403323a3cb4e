//! Identifier-equivalence graph: `(provider, id, scope)` nodes asserting
//! cross-provider identity.
//!
//! Grounded on `anibridge_mappings/core/graph.py::IdMappingGraph`.

use super::base::AdjacencyGraph;
use crate::descriptor::Descriptor;
use std::collections::HashMap;

/// Undirected graph over descriptors asserting identity (spec.md §4.1).
#[derive(Debug, Clone, Default)]
pub struct IdentifierGraph {
    inner: AdjacencyGraph<Descriptor>,
}

/// Plain lexicographic ordering over `(provider, id, scope_or_empty)`
/// (spec.md §4.1 "Canonical node ordering"). This is intentionally
/// *not* the numeric-aware order used for rendering
/// ([`Descriptor::sort_key`]) — graph traversal order and output-key
/// order are different concerns with different rules.
impl Ord for Descriptor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.provider, &self.id, self.scope.as_deref().unwrap_or(""))
            .cmp(&(&other.provider, &other.id, other.scope.as_deref().unwrap_or("")))
    }
}

impl PartialOrd for Descriptor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl IdentifierGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn add_edge(&mut self, a: Descriptor, b: Descriptor) {
        self.inner.add_edge(a, b);
    }

    /// Connect every descriptor in `nodes` to the first (spec.md §4.1).
    pub fn add_equivalence_class<I: IntoIterator<Item = Descriptor>>(&mut self, nodes: I) {
        self.inner.add_equivalence_class(nodes);
    }

    pub fn neighbors(&self, node: &Descriptor) -> Vec<Descriptor> {
        self.inner.neighbors(node)
    }

    pub fn contains_node(&self, node: &Descriptor) -> bool {
        self.inner.contains_node(node)
    }

    pub fn nodes(&self) -> Vec<Descriptor> {
        self.inner.nodes()
    }

    pub fn connected_component(&self, start: &Descriptor) -> Vec<Descriptor> {
        self.inner.connected_component(start)
    }

    /// The component containing `start`, grouped by provider — useful for
    /// inference, which needs every node of a component keyed by its
    /// provider tag.
    pub fn component_grouped_by_provider(&self, start: &Descriptor) -> HashMap<String, Vec<Descriptor>> {
        let mut grouped: HashMap<String, Vec<Descriptor>> = HashMap::new();
        for node in self.inner.connected_component(start) {
            grouped.entry(node.provider.clone()).or_default().push(node);
        }
        grouped
    }

    /// Merge another identifier graph's edges into this one (spec.md §4.3
    /// step 2: identifier graphs from all sources are unioned).
    pub fn union_from(&mut self, other: &IdentifierGraph) {
        for (a, b) in other.inner.iter_unique_edges() {
            self.inner.add_edge(a, b);
        }
        for node in other.inner.nodes() {
            self.inner.ensure_node(node);
        }
    }

    /// All connected components, each in canonical node order, the
    /// components themselves ordered by their first member.
    pub fn components(&self) -> Vec<Vec<Descriptor>> {
        let mut seen = std::collections::HashSet::new();
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
}
