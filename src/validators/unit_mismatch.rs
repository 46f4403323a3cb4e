//! Unit-mismatch validator: for a simple closed, unratioed source range
//! paired with a simple closed target range, checks the unit arithmetic
//! line up (spec.md §4.5). No original counterpart.

use super::{ValidationContext, ValidationIssue, Validator};
use crate::range::{parse_segment, parse_source_segment};

pub struct UnitMismatchValidator;

impl Validator for UnitMismatchValidator {
    fn name(&self) -> &'static str {
        "unit_mismatch"
    }

    fn validate(&self, ctx: &ValidationContext) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for (source, targets) in &ctx.source_map {
            for (target, source_ranges) in targets {
                for (source_range, target_ranges) in source_ranges {
                    let Ok(src_seg) = parse_source_segment(source_range) else { continue };
                    if src_seg.ratio.is_some() {
                        continue;
                    }
                    let Some(source_len) = src_seg.target_episode_count() else { continue };

                    for target_range in target_ranges {
                        let Ok(tgt_seg) = parse_segment(target_range) else { continue };
                        let Some(target_len) = tgt_seg.target_episode_count() else { continue };

                        let matches = match tgt_seg.ratio {
                            None | Some(1) => {
                                target_len == source_len
                                    || (target_len != 0 && source_len % target_len == 0)
                                    || (source_len != 0 && target_len % source_len == 0)
                            }
                            Some(r) if r > 0 => target_len == source_len * r as u64,
                            Some(r) => source_len == target_len * r.unsigned_abs(),
                        };

                        if !matches {
                            issues.push(
                                ValidationIssue::new(self.name(), "Source and target unit counts do not agree")
                                    .with_source(source.to_string())
                                    .with_target(target.to_string())
                                    .with_source_range(source_range.clone())
                                    .with_target_range(target_range.clone())
                                    .with_detail("source_len", source_len)
                                    .with_detail("target_len", target_len),
                            );
                        }
                    }
                }
            }
        }

        issues
    }
}
