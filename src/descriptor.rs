//! Descriptors: `(provider, id, scope)` triples identifying a mappable entity.
//!
//! A descriptor is intentionally *not* a closed sum type over known
//! providers (new sources add providers over time, per Design Notes §9
//! "Dynamic descriptor typing") — it's a plain value type with a string
//! `provider` tag.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// `(provider, id, scope)` — the unit of identity in both the identifier
/// graph and the episode graph (where it's paired with a range label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    pub provider: String,
    pub id: String,
    pub scope: Option<String>,
}

impl Descriptor {
    pub fn new(provider: impl Into<String>, id: impl Into<String>, scope: Option<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
            scope,
        }
    }

    pub fn without_scope(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(provider, id, None)
    }

    /// Canonical sort key: provider, then id (numeric-aware), then scope
    /// (numeric-aware for `sN`, lexicographic otherwise, absent-scope first).
    ///
    /// Grounded on `_provider_scope_sort_key` / `_descriptor_sort_key` in the
    /// original source.
    pub fn sort_key(&self) -> DescriptorSortKey {
        DescriptorSortKey {
            provider: self.provider.clone(),
            id: IdKey::parse(&self.id),
            scope: ScopeKey::parse(self.scope.as_deref()),
        }
    }

    /// Parse `provider:id` or `provider:id:scope` into a `Descriptor`.
    ///
    /// Applies the AniDB-specific special rule: `anidb:N` with no scope is
    /// normalized to scope `R` (spec.md §4.6).
    pub fn parse(text: &str) -> Result<Self, String> {
        let parts: Vec<&str> = text.splitn(3, ':').collect();
        let descriptor = match parts.as_slice() {
            [provider, id] => Descriptor::new(*provider, *id, None),
            [provider, id, scope] => Descriptor::new(*provider, *id, Some((*scope).to_string())),
            _ => return Err(format!("invalid descriptor: {text}")),
        };
        if descriptor.provider.is_empty() || descriptor.id.is_empty() {
            return Err(format!("invalid descriptor: {text}"));
        }
        Ok(descriptor.normalize_anidb())
    }

    fn normalize_anidb(mut self) -> Self {
        if self.provider == "anidb" && self.scope.is_none() {
            self.scope = Some("R".to_string());
        }
        self
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}:{}", self.provider, self.id, scope),
            None => write!(f, "{}:{}", self.provider, self.id),
        }
    }
}

/// Normalize a raw AniDB scope attribute into the canonical `R`/`S`/other
/// single-letter scope, per the alias table in
/// `anime_lists.py::_anidb_scope_from_attr`.
///
/// Aliases: `a`, `1`, empty, `r`, `R` -> `R` (regular episodes); `0`, `s`,
/// `special`, `specials`, `S` -> `S` (specials); any other single ASCII
/// letter passes through uppercased; anything else falls back to `R`.
pub fn normalize_anidb_scope(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "R".to_string();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "R".to_string();
    }
    let lowered = trimmed.to_ascii_lowercase();
    if matches!(lowered.as_str(), "a" | "1" | "r") {
        return "R".to_string();
    }
    if matches!(lowered.as_str(), "0" | "s" | "special" | "specials") {
        return "S".to_string();
    }
    if trimmed.chars().count() == 1 && trimmed.chars().next().unwrap().is_ascii_alphabetic() {
        return trimmed.to_ascii_uppercase();
    }
    "R".to_string()
}

/// Sort key for a numeric-or-string id: numeric ids sort numerically,
/// before non-numeric ids which sort lexicographically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKey {
    Numeric(u64),
    Text(String),
}

impl IdKey {
    fn parse(id: &str) -> Self {
        match id.parse::<u64>() {
            Ok(n) => IdKey::Numeric(n),
            Err(_) => IdKey::Text(id.to_string()),
        }
    }
}

impl PartialOrd for IdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IdKey::Numeric(a), IdKey::Numeric(b)) => a.cmp(b),
            (IdKey::Numeric(_), IdKey::Text(_)) => Ordering::Less,
            (IdKey::Text(_), IdKey::Numeric(_)) => Ordering::Greater,
            (IdKey::Text(a), IdKey::Text(b)) => a.cmp(b),
        }
    }
}

/// Sort key for a scope: absent sorts first, `sN` sorts numerically among
/// themselves, everything else sorts lexicographically after those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKey {
    Absent,
    Season(u64),
    Other(String),
}

impl ScopeKey {
    fn parse(scope: Option<&str>) -> Self {
        match scope {
            None => ScopeKey::Absent,
            Some(s) => {
                if let Some(rest) = s.strip_prefix('s') {
                    if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                        if let Ok(n) = rest.parse::<u64>() {
                            return ScopeKey::Season(n);
                        }
                    }
                }
                ScopeKey::Other(s.to_string())
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ScopeKey::Absent => 0,
            ScopeKey::Season(_) => 1,
            ScopeKey::Other(_) => 2,
        }
    }
}

impl PartialOrd for ScopeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScopeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ScopeKey::Season(a), ScopeKey::Season(b)) => a.cmp(b),
            (ScopeKey::Other(a), ScopeKey::Other(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSortKey {
    provider: String,
    id: IdKey,
    scope: ScopeKey,
}

impl PartialOrd for DescriptorSortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DescriptorSortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.provider
            .cmp(&other.provider)
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.scope.cmp(&other.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_without_scope() {
        let d = Descriptor::parse("anilist:12").unwrap();
        assert_eq!(d.provider, "anilist");
        assert_eq!(d.id, "12");
        assert_eq!(d.scope, None);
    }

    #[test]
    fn parse_with_scope() {
        let d = Descriptor::parse("tvdb_show:99:s1").unwrap();
        assert_eq!(d.scope.as_deref(), Some("s1"));
    }

    #[test]
    fn anidb_without_scope_normalizes_to_r() {
        let d = Descriptor::parse("anidb:5").unwrap();
        assert_eq!(d.scope.as_deref(), Some("R"));
    }

    #[test]
    fn anidb_with_explicit_scope_is_untouched() {
        let d = Descriptor::parse("anidb:5:S").unwrap();
        assert_eq!(d.scope.as_deref(), Some("S"));
    }

    #[test]
    fn rejects_malformed_descriptor() {
        assert!(Descriptor::parse("nocolon").is_err());
        assert!(Descriptor::parse(":5").is_err());
    }

    #[test]
    fn display_roundtrips() {
        assert_eq!(Descriptor::parse("mal:1").unwrap().to_string(), "mal:1");
        assert_eq!(
            Descriptor::parse("tvdb_show:1:s2").unwrap().to_string(),
            "tvdb_show:1:s2"
        );
    }

    #[test]
    fn anidb_alias_table() {
        assert_eq!(normalize_anidb_scope(None), "R");
        assert_eq!(normalize_anidb_scope(Some("a")), "R");
        assert_eq!(normalize_anidb_scope(Some("1")), "R");
        assert_eq!(normalize_anidb_scope(Some("")), "R");
        assert_eq!(normalize_anidb_scope(Some("0")), "S");
        assert_eq!(normalize_anidb_scope(Some("specials")), "S");
        assert_eq!(normalize_anidb_scope(Some("S")), "S");
        assert_eq!(normalize_anidb_scope(Some("c")), "C");
        assert_eq!(normalize_anidb_scope(Some("weird")), "R");
    }

    #[test]
    fn sort_key_numeric_ids_before_text() {
        let a = Descriptor::without_scope("mal", "2").sort_key();
        let b = Descriptor::without_scope("mal", "10").sort_key();
        let c = Descriptor::without_scope("mal", "abc").sort_key();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn sort_key_absent_scope_before_season_before_other() {
        let none = Descriptor::new("tvdb_show", "1", None).sort_key();
        let s1 = Descriptor::new("tvdb_show", "1", Some("s1".into())).sort_key();
        let s10 = Descriptor::new("tvdb_show", "1", Some("s10".into())).sort_key();
        let other = Descriptor::new("tvdb_show", "1", Some("R".into())).sort_key();
        assert!(none < s1);
        assert!(s1 < s10);
        assert!(s10 < other);
    }
}
