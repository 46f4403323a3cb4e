//! Rendering-time collapse: turn many raw source→target edges for one
//! `(source scope, target scope)` pair into the canonical minimal set of
//! range entries (spec.md §4.2 "Collapse").
//!
//! Grounded on `anibridge_mappings/utils/mapping.py`
//! (`collapse_source_mappings`, `_build_units`, `_merge_units`,
//! `_merge_adjacent_numeric_keys`, `_compute_ratio`), generalized per
//! spec.md's prose for the ratio-inference case the retrieved original
//! doesn't actually reach (see DESIGN.md).

use super::{parse_segment, Segment};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Collapse a single target scope's raw `source_range -> {target_range}`
/// map into the schema-friendly `source_range -> target_range_spec` map.
pub fn collapse(source_map: &HashMap<String, HashSet<String>>) -> BTreeMap<String, String> {
    let mut ready_numeric: Vec<(u64, u64, u64, u64, Option<i64>)> = Vec::new(); // start,end,t_start,t_end,ratio
    let mut per_source: HashMap<u64, Vec<u64>> = HashMap::new();
    let mut special_entries: HashMap<String, HashSet<String>> = HashMap::new();

    for (source_range, target_ranges) in source_map {
        for part in source_range.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            classify_part(part, target_ranges, &mut ready_numeric, &mut per_source, &mut special_entries);
        }
    }

    let mut result: BTreeMap<String, String> = BTreeMap::new();

    for (start, end, t_start, t_end, ratio) in ready_numeric {
        let key = format_range(start, end);
        let value = format_target_with_ratio(t_start, t_end, ratio);
        result.insert(key, value);
    }

    for (source, value) in collapse_per_source(per_source) {
        result.insert(source, value);
    }

    for (part, targets) in special_entries {
        let raw: Vec<&str> = targets.iter().map(String::as_str).collect();
        if let Some(spec) = super::merge_target_specs(raw) {
            result.insert(part, spec);
        }
    }

    merge_adjacent_numeric_keys(result)
}

/// Classify one source-range segment as a direct numeric-with-ratio group
/// (a single edge whose target span is an integer multiple/divisor of the
/// source span), a per-episode contributor (eligible for contiguity
/// merging), or "special" (passed through `merge_target_specs`).
fn classify_part(
    part: &str,
    target_ranges: &HashSet<String>,
    ready_numeric: &mut Vec<(u64, u64, u64, u64, Option<i64>)>,
    per_source: &mut HashMap<u64, Vec<u64>>,
    special_entries: &mut HashMap<String, HashSet<String>>,
) {
    if part.contains('|') {
        special_entries
            .entry(part.to_string())
            .or_default()
            .extend(target_ranges.iter().cloned());
        return;
    }

    let Ok(seg) = parse_segment(part) else {
        special_entries
            .entry(part.to_string())
            .or_default()
            .extend(target_ranges.iter().cloned());
        return;
    };

    let Some(end) = seg.end else {
        special_entries
            .entry(part.to_string())
            .or_default()
            .extend(target_ranges.iter().cloned());
        return;
    };
    let start = seg.start;
    let source_len = end - start + 1;

    let Some(expanded) = expand_plain_numeric_targets(target_ranges) else {
        special_entries
            .entry(part.to_string())
            .or_default()
            .extend(target_ranges.iter().cloned());
        return;
    };

    if expanded.is_empty() {
        special_entries
            .entry(part.to_string())
            .or_default()
            .extend(target_ranges.iter().cloned());
        return;
    }

    if source_len == 1 {
        per_source.insert(start, expanded);
        return;
    }

    let total = expanded.len() as u64;
    if total == source_len {
        for (idx, ep) in (start..=end).enumerate() {
            per_source.insert(ep, vec![expanded[idx]]);
        }
        return;
    }

    if is_contiguous(&expanded) {
        if let Some(ratio) = compute_ratio(source_len, total) {
            ready_numeric.push((start, end, expanded[0], *expanded.last().unwrap(), ratio));
            return;
        }
    }

    special_entries
        .entry(part.to_string())
        .or_default()
        .extend(target_ranges.iter().cloned());
}

/// Expand a set of target range strings into a sorted, deduplicated list of
/// episode numbers, but only when every member is a plain closed numeric
/// segment (no ratio, no open end). Returns `None` if any member fails
/// that test.
fn expand_plain_numeric_targets(targets: &HashSet<String>) -> Option<Vec<u64>> {
    let mut numbers: HashSet<u64> = HashSet::new();
    for value in targets {
        let seg = parse_segment(value).ok()?;
        if seg.ratio.is_some() {
            return None;
        }
        let end = seg.end?;
        for ep in seg.start..=end {
            numbers.insert(ep);
        }
    }
    let mut sorted: Vec<u64> = numbers.into_iter().collect();
    sorted.sort_unstable();
    Some(sorted)
}

fn is_contiguous(values: &[u64]) -> bool {
    values.windows(2).all(|w| w[1] == w[0] + 1)
}

/// Integer ratio between source and target lengths. `None` if equal or if
/// the larger doesn't divide the smaller evenly.
fn compute_ratio(source_len: u64, target_len: u64) -> Option<i64> {
    if target_len == source_len {
        return None;
    }
    let (larger, smaller, sign) = if target_len > source_len {
        (target_len, source_len, 1i64)
    } else {
        (source_len, target_len, -1i64)
    };
    if smaller == 0 || larger % smaller != 0 {
        return None;
    }
    Some(sign * (larger / smaller) as i64)
}

#[derive(Debug, Clone)]
struct Unit {
    source_start: u64,
    source_end: u64,
    source_len: u64,
    target_start: u64,
    target_end: u64,
    target_len: u64,
    ratio_sign: i64,
}

/// Split `per_source` into non-contiguous singletons (emitted directly)
/// and contiguous entries (grouped into units, then merged with adjacency
/// ratio checks).
fn collapse_per_source(per_source: HashMap<u64, Vec<u64>>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let mut contiguous: BTreeMap<u64, Vec<u64>> = BTreeMap::new();

    for (source, targets) in per_source {
        if is_contiguous(&targets) {
            contiguous.insert(source, targets);
        } else {
            out.push((source.to_string(), compress_ranges(&targets).join(",")));
        }
    }

    if contiguous.is_empty() {
        return out;
    }

    let units = build_units(&contiguous);
    for segment in merge_units(units) {
        let source_start = segment[0].source_start;
        let source_end = segment.last().unwrap().source_end;
        let source_len: u64 = segment.iter().map(|u| u.source_len).sum();
        let target_start = segment[0].target_start;
        let target_end = segment.last().unwrap().target_end;
        let target_len = target_end - target_start + 1;
        let ratio = compute_ratio(source_len, target_len);
        out.push((
            format_range(source_start, source_end),
            format_target_with_ratio(target_start, target_end, ratio),
        ));
    }

    out
}

fn build_units(contiguous: &BTreeMap<u64, Vec<u64>>) -> Vec<Unit> {
    let sources: Vec<u64> = contiguous.keys().copied().collect();
    let mut units = Vec::new();
    let mut idx = 0usize;
    while idx < sources.len() {
        let targets = &contiguous[&sources[idx]];
        let mut j = idx + 1;
        while j < sources.len()
            && sources[j] == sources[j - 1] + 1
            && &contiguous[&sources[j]] == targets
        {
            j += 1;
        }
        let source_len = (j - idx) as u64;
        let target_len = targets.len() as u64;
        units.push(Unit {
            source_start: sources[idx],
            source_end: sources[j - 1],
            source_len,
            target_start: targets[0],
            target_end: *targets.last().unwrap(),
            target_len,
            ratio_sign: if target_len >= source_len { 1 } else { -1 },
        });
        idx = j;
    }
    units
}

fn merge_units(units: Vec<Unit>) -> Vec<Vec<Unit>> {
    let mut merged: Vec<Vec<Unit>> = Vec::new();
    let mut idx = 0usize;
    while idx < units.len() {
        let mut segment = vec![units[idx].clone()];
        idx += 1;
        while idx < units.len() && can_merge_unit(segment.last().unwrap(), &units[idx]) {
            segment.push(units[idx].clone());
            idx += 1;
        }
        merged.push(segment);
    }
    merged
}

fn can_merge_unit(prev: &Unit, next: &Unit) -> bool {
    if next.source_start != prev.source_end + 1 {
        return false;
    }
    if next.ratio_sign != prev.ratio_sign {
        return false;
    }
    if prev.ratio_sign == 1 {
        next.target_len == prev.target_len && next.target_start == prev.target_end + 1
    } else {
        next.target_len == prev.target_len
            && next.source_len == prev.source_len
            && next.target_start == prev.target_start + prev.target_len
    }
}

fn compress_ranges(values: &[u64]) -> Vec<String> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mut ranges = Vec::new();
    let mut start = sorted[0];
    let mut prev = sorted[0];
    for &current in &sorted[1..] {
        if current == prev + 1 {
            prev = current;
            continue;
        }
        ranges.push(format_range(start, prev));
        start = current;
        prev = current;
    }
    ranges.push(format_range(start, prev));
    ranges
}

fn format_range(start: u64, end: u64) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

fn format_target_with_ratio(start: u64, end: u64, ratio: Option<i64>) -> String {
    let base = format_range(start, end);
    match ratio {
        None | Some(1) => base,
        Some(r) => format!("{base}|{r}"),
    }
}

/// Parse a numeric source key (`"n"` or `"a-b"`, no `|`/`,`) back into
/// bounds, or `None` if it isn't a plain closed numeric key.
fn parse_source_key(key: &str) -> Option<(u64, u64)> {
    if key.contains('|') || key.contains(',') {
        return None;
    }
    let seg: Segment = parse_segment(key).ok()?;
    seg.end.map(|end| (seg.start, end))
}

/// Expand a value spec (possibly comma-joined) into the sorted episode
/// numbers its plain closed numeric pieces cover, ignoring ratio-bearing
/// and open pieces (they contribute nothing, matching
/// `_expand_numeric_targets`'s treatment of non-numeric members).
fn expand_value_spec(value: &str) -> HashSet<u64> {
    let mut out = HashSet::new();
    for piece in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if piece.contains('|') {
            continue;
        }
        if let Ok(seg) = parse_segment(piece) {
            if let Some(end) = seg.end {
                for ep in seg.start..=end {
                    out.insert(ep);
                }
            }
        }
    }
    out
}

/// Final adjacent-key post-pass (spec.md §4.2 "Adjacent-key post-pass"):
/// greedily merge contiguous numeric source keys whose target union is
/// itself a contiguous range of equal cardinality (longest run first);
/// otherwise fall back to merging consecutive keys with byte-identical
/// target specs. Non-numeric keys pass through untouched.
fn merge_adjacent_numeric_keys(mapping: BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut numeric_items: Vec<(u64, u64, String)> = Vec::new();
    let mut others: BTreeMap<String, String> = BTreeMap::new();

    for (k, v) in mapping {
        match parse_source_key(&k) {
            Some((start, end)) => numeric_items.push((start, end, v)),
            None => {
                others.insert(k, v);
            }
        }
    }

    if numeric_items.is_empty() {
        return others;
    }

    numeric_items.sort_by_key(|(start, _, _)| *start);

    #[derive(Clone)]
    struct Row {
        ep: u64,
        val: String,
        expanded: HashSet<u64>,
    }

    let mut episodes: Vec<Row> = Vec::new();
    for (start, end, val) in numeric_items {
        let expanded = expand_value_spec(&val);
        for ep in start..=end {
            episodes.push(Row {
                ep,
                val: val.clone(),
                expanded: expanded.clone(),
            });
        }
    }

    let n = episodes.len();
    let mut idx = 0usize;
    let mut out_entries: Vec<(u64, u64, String)> = Vec::new();

    while idx < n {
        let mut union_set: HashSet<u64> = HashSet::new();
        let mut found = false;
        for j in idx..n {
            if j > idx && episodes[j].ep != episodes[j - 1].ep + 1 {
                break;
            }
            union_set.extend(episodes[j].expanded.iter().copied());
            if union_set.is_empty() {
                continue;
            }
            let umin = *union_set.iter().min().unwrap();
            let umax = *union_set.iter().max().unwrap();
            if (umax - umin + 1) == union_set.len() as u64 && union_set.len() == (j - idx + 1) {
                out_entries.push((episodes[idx].ep, episodes[j].ep, format_range(umin, umax)));
                idx = j + 1;
                found = true;
                break;
            }
        }

        if found {
            continue;
        }

        let cur_val = episodes[idx].val.clone();
        let run_start = episodes[idx].ep;
        let mut run_end = run_start;
        let mut k = idx + 1;
        while k < n && episodes[k].ep == run_end + 1 && episodes[k].val == cur_val {
            run_end = episodes[k].ep;
            k += 1;
        }
        out_entries.push((run_start, run_end, cur_val));
        idx = k;
    }

    let mut out = BTreeMap::new();
    for (s, e, v) in out_entries {
        out.insert(format_range(s, e), v);
    }
    out.extend(others);
    out
}
