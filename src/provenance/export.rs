//! Compact provenance export (spec.md §6.4): pool-deduplicated JSON
//! instead of repeating full descriptor/range/stage/actor/reason strings
//! per event. Grounded on
//! `anibridge_mappings/core/provenance.py::build_provenance_payload`.

use super::{ProvenanceAction, ProvenanceEvent};
use crate::graph::episode::EpisodeNode;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct CompactPayload {
    pub dict: Pools,
    pub mappings: Vec<MappingEntry>,
}

#[derive(Debug, Serialize)]
pub struct Pools {
    pub descriptors: Vec<String>,
    pub ranges: Vec<String>,
    pub actions: Vec<&'static str>,
    pub stages: Vec<String>,
    pub actors: Vec<String>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MappingEntry {
    /// `[descriptor_index, range_index]` for the source endpoint.
    pub s: [usize; 2],
    /// `[descriptor_index, range_index]` for the target endpoint.
    pub t: [usize; 2],
    /// `1` iff the edge is present in the final graph, else `0`.
    pub p: u8,
    /// Total event count for this edge (convenience denormalization).
    pub n: usize,
    pub ev: Vec<CompactEvent>,
}

#[derive(Debug, Serialize)]
pub struct CompactEvent {
    pub seq: u64,
    /// Index into `dict.actions`.
    pub a: usize,
    /// Index into `dict.stages`.
    pub s: usize,
    pub e: bool,
    /// Index into `dict.reasons`, if a reason was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<usize>,
    /// Index into `dict.actors`, if an actor was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ac: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<HashMap<String, serde_json::Value>>,
}

struct Pool {
    index: HashMap<String, usize>,
    values: Vec<String>,
}

impl Pool {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            values: Vec::new(),
        }
    }

    fn intern(&mut self, value: &str) -> usize {
        if let Some(&idx) = self.index.get(value) {
            return idx;
        }
        let idx = self.values.len();
        self.index.insert(value.to_string(), idx);
        self.values.push(value.to_string());
        idx
    }
}

/// Build the compact export payload from an edge-ordered provenance
/// history plus a presence predicate (whether the edge still exists in
/// the current graph).
pub fn build_compact_payload(
    history: &[(EpisodeNode, EpisodeNode, &[ProvenanceEvent])],
    is_present: impl Fn(&EpisodeNode, &EpisodeNode) -> bool,
) -> CompactPayload {
    let mut descriptors = Pool::new();
    let mut ranges = Pool::new();
    let mut stages = Pool::new();
    let mut actors = Pool::new();
    let mut reasons = Pool::new();

    let mut mappings = Vec::with_capacity(history.len());

    for (source, target, events) in history {
        let s = [
            descriptors.intern(&source.descriptor.to_string()),
            ranges.intern(&source.range_label),
        ];
        let t = [
            descriptors.intern(&target.descriptor.to_string()),
            ranges.intern(&target.range_label),
        ];

        let ev: Vec<CompactEvent> = events
            .iter()
            .map(|event| CompactEvent {
                seq: event.seq,
                a: match event.action {
                    ProvenanceAction::Add => 0,
                    ProvenanceAction::Remove => 1,
                },
                s: stages.intern(&event.stage),
                e: event.effective,
                r: event.reason.as_deref().map(|r| reasons.intern(r)),
                ac: event.actor.as_deref().map(|a| actors.intern(a)),
                d: if event.details.is_empty() {
                    None
                } else {
                    Some(event.details.clone())
                },
            })
            .collect();

        mappings.push(MappingEntry {
            s,
            t,
            p: u8::from(is_present(source, target)),
            n: ev.len(),
            ev,
        });
    }

    CompactPayload {
        dict: Pools {
            descriptors: descriptors.values,
            ranges: ranges.values,
            actions: vec!["add", "remove"],
            stages: stages.values,
            actors: actors.values,
            reasons: reasons.values,
        },
        mappings,
    }
}
