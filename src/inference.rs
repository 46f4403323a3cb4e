//! Metadata-driven inference: identical metadata across identifier-graph-
//! connected entities proposes a straight `1..N ↔ 1..N` episode edge
//! (spec.md §4.4).
//!
//! This *generalizes* `anibridge_mappings/core/inference.py`'s simpler
//! exact-tuple match (`_meta_key`, an exact `(type, episodes, duration,
//! start_year)` key) into spec.md's wildcard/tolerance rules. The two are
//! intentionally kept distinct — see DESIGN.md "Open Question decisions".

use crate::descriptor::Descriptor;
use crate::graph::episode::EpisodeNode;
use crate::graph::{EpisodeGraph, IdentifierGraph};
use crate::meta::{MetaStore, SourceMeta, SourceType};
use crate::provenance::ProvenanceContext;

const TOLERANCE: f64 = 0.10;

/// `|a-b| / max(|a|,|b|)`, `0` when both are `0`. `None` if either side is
/// missing (spec.md §4.4).
fn relative_delta(a: Option<u32>, b: Option<u32>) -> Option<f64> {
    let (a, b) = (a?, b?);
    if a == 0 && b == 0 {
        return Some(0.0);
    }
    let diff = (a as f64 - b as f64).abs();
    let denom = (a as f64).abs().max((b as f64).abs());
    Some(diff / denom)
}

fn within_tolerance(a: Option<u32>, b: Option<u32>) -> bool {
    relative_delta(a, b).is_some_and(|d| d <= TOLERANCE)
}

/// Does this pair of metadata records "match" for inference purposes
/// (spec.md §4.4)? Movie rules require year and duration agreement;
/// TV rules treat either-side-absent as a wildcard.
pub fn meta_match(a: &SourceMeta, b: &SourceMeta) -> bool {
    let (Some(kind_a), Some(kind_b)) = (a.kind, b.kind) else {
        return false;
    };
    if kind_a != kind_b {
        return false;
    }

    match (a.effective_episodes(), b.effective_episodes()) {
        (Some(ea), Some(eb)) if ea == eb => {}
        _ => return false,
    }

    match kind_a {
        SourceType::Movie => {
            if a.start_year.is_none() || b.start_year.is_none() || a.start_year != b.start_year {
                return false;
            }
            within_tolerance(a.duration, b.duration)
        }
        SourceType::Tv => {
            if a.start_year.is_some() && b.start_year.is_some() && a.start_year != b.start_year {
                return false;
            }
            if a.duration.is_some() && b.duration.is_some() && !within_tolerance(a.duration, b.duration) {
                return false;
            }
            true
        }
    }
}

fn episode_range_label(episodes: u32) -> String {
    if episodes == 1 {
        "1".to_string()
    } else {
        format!("1-{episodes}")
    }
}

/// For every connected component of the identifier graph, test every
/// unordered pair of metadata-bearing members and emit an inferred
/// episode edge on match (spec.md §4.4, §4.3 step 5).
pub fn infer_episode_mappings(id_graph: &IdentifierGraph, meta_store: &MetaStore, episode_graph: &mut EpisodeGraph) {
    for component in id_graph.components() {
        let candidates: Vec<(Descriptor, &SourceMeta)> = component
            .into_iter()
            .filter_map(|descriptor| {
                let meta = meta_store.get(&descriptor)?;
                meta.effective_episodes()?;
                Some((descriptor, meta))
            })
            .collect();

        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let (desc_a, meta_a) = &candidates[i];
                let (desc_b, meta_b) = &candidates[j];
                if !meta_match(meta_a, meta_b) {
                    continue;
                }
                let episodes = meta_a.effective_episodes().unwrap();
                let label = episode_range_label(episodes);
                let node_a = EpisodeNode::new(desc_a.clone(), label.clone());
                let node_b = EpisodeNode::new(desc_b.clone(), label);
                episode_graph.add_edge_with_provenance(
                    node_a,
                    node_b,
                    Some(ProvenanceContext::new("Inference").with_reason("metadata alignment")),
                );
            }
        }
    }
}
