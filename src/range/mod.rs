//! Range algebra: parsing, ratio handling, merge, overlap.
//!
//! A [`Segment`] models one contiguous inclusive episode interval,
//! optionally open-ended, optionally carrying a ratio. Target range specs
//! are comma-separated lists of segments; source ranges must be a single
//! segment (spec.md §4.2).
//!
//! Grounded on `anibridge_mappings/utils/mapping.py`
//! (`parse_range_bounds`/`_split_ratio`).

pub mod collapse;

use std::cmp::Ordering;
use std::fmt;

/// A single contiguous, inclusive episode range, optionally open-ended,
/// optionally carrying a ratio suffix (`|r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u64,
    /// `None` means open-ended (`a-`).
    pub end: Option<u64>,
    /// `None` means no ratio suffix. `r > 0` expands, `r < 0` collapses.
    /// Never `Some(0)` — rejected at parse time.
    pub ratio: Option<i64>,
}

impl Segment {
    pub fn single(n: u64) -> Self {
        Self {
            start: n,
            end: Some(n),
            ratio: None,
        }
    }

    pub fn closed(start: u64, end: u64) -> Self {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        Self {
            start,
            end: Some(end),
            ratio: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }

    /// Effective ratio for arithmetic purposes: `|1` is redundant and
    /// treated identically to no ratio at all.
    fn effective_ratio(&self) -> Option<i64> {
        match self.ratio {
            Some(1) => None,
            other => other,
        }
    }

    /// Number of target episodes this segment occupies. Always
    /// `end - start + 1` when closed; `None` when open (unbounded).
    pub fn target_episode_count(&self) -> Option<u64> {
        self.end.map(|end| end - self.start + 1)
    }

    /// Number of source units this segment represents, applying the ratio.
    /// `None` when open, or when a positive ratio doesn't divide evenly.
    pub fn source_unit_count(&self) -> Option<u64> {
        let len = self.target_episode_count()?;
        match self.effective_ratio() {
            None => Some(len),
            Some(r) if r > 0 => {
                let r = r as u64;
                if r != 0 && len % r == 0 {
                    Some(len / r)
                } else {
                    None
                }
            }
            Some(r) => Some(len * r.unsigned_abs()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start)?,
            Some(end) => write!(f, "{}-{}", self.start, end)?,
            None => write!(f, "{}-", self.start)?,
        }
        if let Some(r) = self.ratio {
            if r != 1 {
                write!(f, "|{r}")?;
            }
        }
        Ok(())
    }
}

/// Sort key used by `merge_target_specs`: `(start, end_or_infinity,
/// ratio_or_1)`.
fn merge_sort_key(seg: &Segment) -> (u64, u64, i64) {
    (seg.start, seg.end.unwrap_or(u64::MAX), seg.ratio.unwrap_or(1))
}

/// Parse a single range segment. Rejects empty strings, a zero ratio, and
/// non-numeric bounds; swaps inverted `start > end` bounds.
pub fn parse_segment(text: &str) -> Result<Segment, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty range segment".to_string());
    }

    let (base, ratio) = match trimmed.split_once('|') {
        None => (trimmed, None),
        Some((base, ratio_raw)) => {
            if ratio_raw.is_empty() {
                return Err(format!("missing ratio after '|' in '{text}'"));
            }
            let ratio: i64 = ratio_raw
                .parse()
                .map_err(|_| format!("invalid ratio '{ratio_raw}' in '{text}'"))?;
            if ratio == 0 {
                return Err(format!("ratio of 0 is invalid in '{text}'"));
            }
            (base, Some(ratio))
        }
    };

    if base.is_empty() {
        return Err(format!("empty base range in '{text}'"));
    }

    if let Some((left, right)) = base.split_once('-') {
        let start: u64 = left
            .parse()
            .map_err(|_| format!("invalid range start '{left}' in '{text}'"))?;
        if right.is_empty() {
            return Ok(Segment {
                start,
                end: None,
                ratio,
            });
        }
        let end: u64 = right
            .parse()
            .map_err(|_| format!("invalid range end '{right}' in '{text}'"))?;
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        Ok(Segment {
            start,
            end: Some(end),
            ratio,
        })
    } else {
        let value: u64 = base
            .parse()
            .map_err(|_| format!("invalid episode number '{base}' in '{text}'"))?;
        Ok(Segment {
            start: value,
            end: Some(value),
            ratio,
        })
    }
}

/// Parse a comma-separated target range spec into its segments.
pub fn parse_target_spec(text: &str) -> Result<Vec<Segment>, String> {
    text.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(parse_segment)
        .collect()
}

/// Parse a source range. Source ranges must be a single segment — any
/// comma is rejected outright (spec.md §4.2).
pub fn parse_source_segment(text: &str) -> Result<Segment, String> {
    if text.contains(',') {
        return Err(format!("source range '{text}' must be a single segment"));
    }
    parse_segment(text)
}

/// Deduplicate many target range specs by `(start, end, ratio)` and
/// re-emit sorted by `(start, end_or_infinity, ratio_or_1)`.
pub fn merge_target_specs<'a, I>(specs: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut segments: Vec<Segment> = Vec::new();
    let mut seen: Vec<(u64, Option<u64>, Option<i64>)> = Vec::new();

    for spec in specs {
        let Ok(parsed) = parse_target_spec(spec) else {
            continue;
        };
        for seg in parsed {
            let key = (seg.start, seg.end, seg.ratio);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            segments.push(seg);
        }
    }

    if segments.is_empty() {
        return None;
    }

    segments.sort_by(|a, b| merge_sort_key(a).cmp(&merge_sort_key(b)));
    Some(
        segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Inclusive-range overlap: `[a1,a2]` and `[b1,b2]` overlap iff not
/// (`a2 < b1` or `b2 < a1`). Either upper bound may be open (+infinity).
pub fn ranges_overlap(a: (u64, Option<u64>), b: (u64, Option<u64>)) -> bool {
    let (a1, a2) = a;
    let (b1, b2) = b;
    let left_disjoint = matches!(a2, Some(e) if e < b1);
    let right_disjoint = matches!(b2, Some(e) if e < a1);
    !(left_disjoint || right_disjoint)
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(merge_sort_key(self).cmp(&merge_sort_key(other)))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        merge_sort_key(self).cmp(&merge_sort_key(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_episode() {
        let seg = parse_segment("7").unwrap();
        assert_eq!(seg, Segment::single(7));
    }

    #[test]
    fn parse_closed_range() {
        let seg = parse_segment("1-12").unwrap();
        assert_eq!(seg, Segment::closed(1, 12));
    }

    #[test]
    fn parse_open_range() {
        let seg = parse_segment("5-").unwrap();
        assert_eq!(seg.start, 5);
        assert_eq!(seg.end, None);
    }

    #[test]
    fn parse_swaps_inverted_bounds() {
        let seg = parse_segment("12-1").unwrap();
        assert_eq!(seg, Segment::closed(1, 12));
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(parse_segment("").is_err());
        assert!(parse_segment("   ").is_err());
    }

    #[test]
    fn parse_rejects_zero_ratio() {
        assert!(parse_segment("1-12|0").is_err());
    }

    #[test]
    fn parse_ratio_suffix() {
        let seg = parse_segment("1-6|2").unwrap();
        assert_eq!(seg.ratio, Some(2));
        let seg = parse_segment("1-12|-2").unwrap();
        assert_eq!(seg.ratio, Some(-2));
    }

    #[test]
    fn format_omits_redundant_ratio_one() {
        let seg = Segment {
            start: 1,
            end: Some(5),
            ratio: Some(1),
        };
        assert_eq!(seg.to_string(), "1-5");
    }

    #[test]
    fn format_single_vs_range() {
        assert_eq!(Segment::single(3).to_string(), "3");
        assert_eq!(Segment::closed(1, 5).to_string(), "1-5");
    }

    #[test]
    fn parse_format_idempotence() {
        for raw in ["1", "1-12", "5-", "1-6|2", "1-12|-2"] {
            let once = parse_segment(raw).unwrap();
            let twice = parse_segment(&once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn source_range_rejects_comma() {
        assert!(parse_source_segment("1-5,7-9").is_err());
    }

    #[test]
    fn target_spec_splits_on_comma() {
        let segs = parse_target_spec("1-5,7-9").unwrap();
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn source_unit_count_applies_ratio() {
        assert_eq!(Segment::closed(1, 6).source_unit_count(), Some(6));
        let expand = parse_segment("1-12|2").unwrap();
        assert_eq!(expand.source_unit_count(), Some(6));
        let collapse = parse_segment("1-12|-2").unwrap();
        assert_eq!(collapse.source_unit_count(), Some(24));
    }

    #[test]
    fn source_unit_count_rejects_non_dividing_ratio() {
        let seg = parse_segment("1-5|2").unwrap();
        assert_eq!(seg.source_unit_count(), None);
    }

    #[test]
    fn merge_dedups_and_sorts() {
        let merged = merge_target_specs(["1-5", "7-9", "1-5", "2-3"]).unwrap();
        assert_eq!(merged, "1-5,2-3,7-9");
    }

    #[test]
    fn merge_returns_none_for_empty() {
        assert_eq!(merge_target_specs(Vec::<&str>::new()), None);
    }

    #[test]
    fn merge_is_order_independent_and_dedup_stable() {
        let a = merge_target_specs(["1-5", "7-9"]).unwrap();
        let b = merge_target_specs(["7-9", "1-5"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            ((1u64, Some(5u64)), (3u64, Some(8u64))),
            ((1, Some(5)), (6, Some(8))),
            ((1, None), (1000, Some(1))),
            ((1, Some(5)), (5, None)),
        ];
        for (a, b) in cases {
            assert_eq!(ranges_overlap(a, b), ranges_overlap(b, a));
        }
    }

    #[test]
    fn overlap_detects_true_and_false_cases() {
        assert!(ranges_overlap((1, Some(5)), (3, Some(8))));
        assert!(!ranges_overlap((1, Some(5)), (6, Some(8))));
        assert!(ranges_overlap((1, None), (1000, Some(1001))));
    }
}
