//! Provenance: an append-only log of every episode-graph edge mutation,
//! plus a scoped-default context for the "who/why" stamped on each one.
//!
//! Grounded on `anibridge_mappings/core/graph.py::ProvenanceContext`/
//! `ProvenanceEvent`/`provenance_context()`. The original is a Python
//! contextmanager; Design Notes §9 calls for an RAII guard in a systems
//! language instead, so the scoped default lives here as
//! [`ProvenanceScope`].

pub mod export;

use std::collections::HashMap;

/// What happened to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceAction {
    Add,
    Remove,
}

/// Caller-supplied context for an edge mutation: which stage of the
/// pipeline, which actor (source name / validator name), and why.
///
/// A context can be installed as the scoped default for a pipeline stage
/// (via [`ProvenanceScope`]); individual calls may pass their own context,
/// which takes precedence field-by-field over the scoped default (spec.md
/// §4.7).
#[derive(Debug, Clone, Default)]
pub struct ProvenanceContext {
    pub stage: Option<String>,
    pub actor: Option<String>,
    pub reason: Option<String>,
    pub details: HashMap<String, serde_json::Value>,
}

impl ProvenanceContext {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            ..Default::default()
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

/// The fields actually stamped onto an event, after resolving a scoped
/// default against an optional call-site override.
pub(crate) struct Resolved {
    pub stage: String,
    pub actor: Option<String>,
    pub reason: Option<String>,
    pub details: HashMap<String, serde_json::Value>,
}

/// Merge a scoped default context with an optional call-site context.
/// Call-site fields win when present; details are merged key-by-key with
/// the call site winning on conflict (spec.md §4.7).
pub(crate) fn resolve(default: Option<&ProvenanceContext>, call: Option<&ProvenanceContext>) -> Resolved {
    // A source's own scratch graph (discarded after `iter_unique_edges()`
    // is read back into the combined graph under a real stage) has no
    // scope of its own; fall back rather than require every throwaway
    // mutation to carry a stage.
    let stage = call
        .and_then(|c| c.stage.clone())
        .or_else(|| default.and_then(|d| d.stage.clone()))
        .unwrap_or_else(|| "unspecified".to_string());

    let actor = call
        .and_then(|c| c.actor.clone())
        .or_else(|| default.and_then(|d| d.actor.clone()));
    let reason = call
        .and_then(|c| c.reason.clone())
        .or_else(|| default.and_then(|d| d.reason.clone()));

    let mut details = HashMap::new();
    if let Some(d) = default {
        details.extend(d.details.clone());
    }
    if let Some(c) = call {
        details.extend(c.details.clone());
    }

    Resolved {
        stage,
        actor,
        reason,
        details,
    }
}

/// One append-only record of an edge mutation (spec.md §3 "Provenance
/// event").
#[derive(Debug, Clone)]
pub struct ProvenanceEvent {
    pub seq: u64,
    pub action: ProvenanceAction,
    pub stage: String,
    pub actor: Option<String>,
    pub reason: Option<String>,
    /// `true` when the action actually changed graph state.
    pub effective: bool,
    pub details: HashMap<String, serde_json::Value>,
}

/// Append-only event log keyed by canonical (sorted) edge endpoint pair.
/// Events for an edge survive the edge's later removal — the history is
/// never pruned (spec.md §3 "Lifecycle").
#[derive(Debug, Clone, Default)]
pub struct ProvenanceLog<N: Eq + std::hash::Hash + Clone + Ord> {
    next_seq: u64,
    events: HashMap<(N, N), Vec<ProvenanceEvent>>,
}

impl<N: Eq + std::hash::Hash + Clone + Ord> ProvenanceLog<N> {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            events: HashMap::new(),
        }
    }

    fn edge_key(a: &N, b: &N) -> (N, N) {
        if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }

    /// Record one event and return its `seq`.
    pub fn record(
        &mut self,
        a: &N,
        b: &N,
        action: ProvenanceAction,
        resolved: Resolved,
        effective: bool,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let event = ProvenanceEvent {
            seq,
            action,
            stage: resolved.stage,
            actor: resolved.actor,
            reason: resolved.reason,
            effective,
            details: resolved.details,
        };
        self.events.entry(Self::edge_key(a, b)).or_default().push(event);
        seq
    }

    /// History sorted by canonical edge order, events within each edge in
    /// original `seq` order (guaranteed by append-only insertion).
    pub fn history(&self) -> Vec<(N, N, &[ProvenanceEvent])> {
        let mut keys: Vec<&(N, N)> = self.events.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| (key.0.clone(), key.1.clone(), self.events[key].as_slice()))
            .collect()
    }

    pub fn events_for(&self, a: &N, b: &N) -> &[ProvenanceEvent] {
        self.events
            .get(&Self::edge_key(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// RAII guard restoring the previous scoped-default context on drop.
/// Grounded on Design Notes §9's explicit instruction to model the
/// Python contextmanager as a guard object in a systems language.
pub struct ProvenanceScope<'a> {
    slot: &'a mut Option<ProvenanceContext>,
    previous: Option<ProvenanceContext>,
}

impl<'a> ProvenanceScope<'a> {
    pub fn new(slot: &'a mut Option<ProvenanceContext>, ctx: ProvenanceContext) -> Self {
        let previous = slot.replace(ctx);
        Self { slot, previous }
    }
}

impl Drop for ProvenanceScope<'_> {
    fn drop(&mut self) {
        *self.slot = self.previous.take();
    }
}
