//! Source metadata: per-descriptor `{type, episodes, duration,
//! start_year}`, mutable and partially settable across sources (spec.md
//! §3 "Source metadata", I6).
//!
//! Grounded on `anibridge_mappings/core/meta.py::SourceType`/`SourceMeta`/
//! `MetaStore`.

use crate::descriptor::Descriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Tv,
    Movie,
}

/// Per-descriptor metadata contribution. Every field is `None` until some
/// source sets it; a later source overwrites only the fields it sets
/// (I6), never clearing fields it leaves `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<u32>,
}

impl SourceMeta {
    /// `episodes`, treating `0` as unknown (spec.md §3).
    pub fn effective_episodes(&self) -> Option<u32> {
        self.episodes.filter(|&e| e > 0)
    }

    /// Overwrite only the fields `incoming` sets, leaving the rest
    /// untouched (I6 positional precedence).
    fn overlay(&mut self, incoming: &SourceMeta) {
        if incoming.kind.is_some() {
            self.kind = incoming.kind;
        }
        if incoming.episodes.is_some() {
            self.episodes = incoming.episodes;
        }
        if incoming.duration.is_some() {
            self.duration = incoming.duration;
        }
        if incoming.start_year.is_some() {
            self.start_year = incoming.start_year;
        }
    }
}

/// `descriptor -> SourceMeta` map, merged across metadata sources in
/// registration order (spec.md §2 step 3, §4.3 step 3).
#[derive(Debug, Clone, Default)]
pub struct MetaStore {
    entries: HashMap<Descriptor, SourceMeta>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, descriptor: &Descriptor) -> Option<&SourceMeta> {
        self.entries.get(descriptor)
    }

    pub fn descriptors(&self) -> Vec<&Descriptor> {
        self.entries.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply one source's contribution for `descriptor`, overwriting only
    /// the fields it sets (I6).
    pub fn set(&mut self, descriptor: Descriptor, incoming: SourceMeta) {
        self.entries.entry(descriptor).or_default().overlay(&incoming);
    }

    /// Merge a later source's whole `MetaStore` into this one — later
    /// overrides earlier, per field (spec.md §4.3 step 3).
    pub fn merge_from(&mut self, other: MetaStore) {
        for (descriptor, meta) in other.entries {
            self.set(descriptor, meta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d() -> Descriptor {
        Descriptor::new("tmdb_show", "42", Some("s1".into()))
    }

    #[test]
    fn effective_episodes_treats_zero_as_unknown() {
        let meta = SourceMeta {
            episodes: Some(0),
            ..Default::default()
        };
        assert_eq!(meta.effective_episodes(), None);
    }

    #[test]
    fn later_source_overwrites_only_fields_it_sets() {
        let mut store = MetaStore::new();
        store.set(
            d(),
            SourceMeta {
                episodes: Some(10),
                kind: Some(SourceType::Tv),
                ..Default::default()
            },
        );
        store.set(
            d(),
            SourceMeta {
                duration: Some(1440),
                ..Default::default()
            },
        );
        let meta = store.get(&d()).unwrap();
        assert_eq!(meta.episodes, Some(10));
        assert_eq!(meta.duration, Some(1440));
        assert_eq!(meta.kind, Some(SourceType::Tv));
        assert_eq!(meta.start_year, None);
    }

    #[test]
    fn merge_from_respects_registration_order() {
        let mut a = MetaStore::new();
        a.set(
            d(),
            SourceMeta {
                episodes: Some(10),
                ..Default::default()
            },
        );
        let mut b = MetaStore::new();
        b.set(
            d(),
            SourceMeta {
                duration: Some(1440),
                ..Default::default()
            },
        );
        a.merge_from(b);
        let meta = a.get(&d()).unwrap();
        assert_eq!(meta.episodes, Some(10));
        assert_eq!(meta.duration, Some(1440));
    }
}
