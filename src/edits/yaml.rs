//! Loading and canonical rewriting of `mappings.edits.yaml` (spec.md §6.3).
//!
//! Grounded on `anibridge_mappings/core/edits.py::load_edits`/
//! `_normalize_node`/`_descriptor_sort_key`. The original uses `ruamel.yaml`'s
//! round-trip/comment-preserving loader; `serde_yaml` (the teacher's existing
//! YAML dependency) has no equivalent comment model, so this module pairs
//! `serde_yaml` for parsing with a small hand-written canonical-form
//! serializer for the rewrite — comment preservation is out of scope (noted
//! in DESIGN.md), but key ordering and value quoting, the load-bearing parts
//! of §6.3, are reproduced exactly.

use super::{EditError, EditsDocument, SourceEntry, TargetEntry};
use std::path::Path;

/// Load, canonically normalize, and rewrite the edits file at `path`.
/// A missing file is not an error — it logs a warning and returns an empty
/// document, matching the original's "continuing without edits" behavior.
pub fn load_edits(path: &Path, schema_version: &str) -> Result<EditsDocument, EditError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "edits file not found, continuing without edits");
            return Ok(EditsDocument::default());
        }
        Err(err) => {
            return Err(EditError::Io {
                path: path.display().to_string(),
                message: err.to_string(),
            })
        }
    };

    let value: serde_yaml::Value = serde_yaml::from_str(&raw).map_err(|err| EditError::Yaml(err.to_string()))?;
    let mapping = match value {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => serde_yaml::Mapping::new(),
        _ => return Err(EditError::Yaml("edits document root must be a mapping".to_string())),
    };

    let mut document = document_from_mapping(&mapping)?;
    document.sources.sort_by(|a, b| descriptor_sort_key(&a.source).cmp(&descriptor_sort_key(&b.source)));
    for entry in &mut document.sources {
        entry
            .targets
            .sort_by(|a, b| descriptor_sort_key(&a.target).cmp(&descriptor_sort_key(&b.target)));
    }

    let rendered = render_canonical(&document, schema_version);
    std::fs::write(path, rendered).map_err(|err| EditError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;

    Ok(document)
}

fn document_from_mapping(mapping: &serde_yaml::Mapping) -> Result<EditsDocument, EditError> {
    let mut sources = Vec::new();
    for (source_key, source_value) in mapping {
        let source = scalar_to_string(source_key);
        if source.starts_with('$') {
            continue;
        }
        let target_mapping = as_mapping(source_value, &source)?;
        let mut targets = Vec::new();
        for (target_key, target_value) in target_mapping {
            let target = scalar_to_string(target_key);
            if target.starts_with('$') {
                continue;
            }
            let range_mapping = as_mapping(target_value, &target)?;
            let mut ranges = Vec::new();
            for (range_key, range_value) in range_mapping {
                let range_key = scalar_to_string(range_key);
                if range_key.starts_with('$') {
                    continue;
                }
                ranges.push((range_key, scalar_to_string(range_value)));
            }
            targets.push(TargetEntry { target, ranges });
        }
        sources.push(SourceEntry { source, targets });
    }
    Ok(EditsDocument { sources })
}

fn as_mapping<'a>(value: &'a serde_yaml::Value, context: &str) -> Result<&'a serde_yaml::Mapping, EditError> {
    match value {
        serde_yaml::Value::Mapping(m) => Ok(m),
        serde_yaml::Value::Null => {
            static EMPTY: once_empty::OnceEmpty = once_empty::OnceEmpty::new();
            Ok(EMPTY.get())
        }
        _ => Err(EditError::Yaml(format!("expected a mapping body for '{context}'"))),
    }
}

/// A `serde_yaml::Mapping::new()` isn't `const`, so a tiny lazily-built
/// empty mapping backs the "empty body" case (spec.md §4.6 "An empty body
/// means remove all edges and add none").
mod once_empty {
    use std::sync::OnceLock;

    pub struct OnceEmpty(OnceLock<serde_yaml::Mapping>);

    impl OnceEmpty {
        pub const fn new() -> Self {
            Self(OnceLock::new())
        }

        pub fn get(&self) -> &serde_yaml::Mapping {
            self.0.get_or_init(serde_yaml::Mapping::new)
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

/// Sort tier for a descriptor-ish key string: `$`-prefixed keys first,
/// then parseable `provider:id[:scope]` keys, then anything else.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortId {
    Numeric(u64),
    Text(String),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortScope {
    Absent,
    Season(u64),
    Other(String),
}

fn descriptor_sort_key(key: &str) -> (u8, String, SortId, SortScope) {
    if key.starts_with('$') {
        return (0, String::new(), SortId::Text(String::new()), SortScope::Absent);
    }

    let parts: Vec<&str> = key.splitn(3, ':').collect();
    match parts.as_slice() {
        [provider, id] => (1, provider.to_string(), parse_id(id), SortScope::Absent),
        [provider, id, scope] => (1, provider.to_string(), parse_id(id), parse_scope(scope)),
        _ => (2, key.to_string(), SortId::Text(String::new()), SortScope::Absent),
    }
}

fn parse_id(id: &str) -> SortId {
    id.parse::<u64>().map(SortId::Numeric).unwrap_or_else(|_| SortId::Text(id.to_string()))
}

fn parse_scope(scope: &str) -> SortScope {
    if let Some(rest) = scope.strip_prefix(['s', 'S']) {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = rest.parse::<u64>() {
                return SortScope::Season(n);
            }
        }
    }
    SortScope::Other(scope.to_string())
}

/// Serialize `document` into the canonical on-disk form: `$schema.version`
/// first, then sorted source/target descriptors, range keys and values
/// double-quoted (spec.md §6.3).
fn render_canonical(document: &EditsDocument, schema_version: &str) -> String {
    let mut out = String::new();
    out.push_str("$schema:\n");
    out.push_str(&format!("  version: \"{schema_version}\"\n"));

    for source in &document.sources {
        out.push_str(&format!("{}:\n", source.source));
        for target in &source.targets {
            out.push_str(&format!("  {}:\n", target.target));
            if target.ranges.is_empty() {
                out.push_str("    {}\n");
                continue;
            }
            for (range_key, range_value) in &target.ranges {
                out.push_str(&format!(
                    "    {}: {}\n",
                    quote(range_key),
                    quote(range_value)
                ));
            }
        }
    }

    out
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_sorts_descriptors_canonically() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "tvdb_show:9:\n  anilist:9:\n    \"1-2\": \"1-2\"\nanilist:9:\n  tvdb_show:9:\n    \"1-2\": \"1-2\"\n"
        )
        .unwrap();

        let document = load_edits(file.path(), "1.0.0").unwrap();
        assert_eq!(document.sources[0].source, "anilist:9");
        assert_eq!(document.sources[1].source, "tvdb_show:9");
    }

    #[test]
    fn missing_file_returns_empty_document() {
        let document = load_edits(Path::new("/nonexistent/mappings.edits.yaml"), "1.0.0").unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn rewrite_double_quotes_range_entries() {
        let document = EditsDocument {
            sources: vec![SourceEntry {
                source: "anilist:9".into(),
                targets: vec![TargetEntry {
                    target: "tvdb_show:9".into(),
                    ranges: vec![("1-2".into(), "1-2".into())],
                }],
            }],
        };
        let rendered = render_canonical(&document, "1.0.0");
        assert!(rendered.contains("\"1-2\": \"1-2\""));
        assert!(rendered.starts_with("$schema:\n  version: \"1.0.0\"\n"));
    }

    #[test]
    fn metadata_keys_are_dropped_on_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "$schema:\n  version: \"0.0.1\"\nanilist:1:\n  tvdb_show:1:\n    \"1\": \"1\"\n").unwrap();
        let document = load_edits(file.path(), "1.0.0").unwrap();
        assert_eq!(document.sources.len(), 1);
        assert_eq!(document.sources[0].source, "anilist:1");
    }
}
