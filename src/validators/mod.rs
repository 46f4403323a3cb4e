//! Rule-based validators over the episode graph (spec.md §4.5).
//!
//! Each validator reports structured issues; it never mutates the graph
//! itself — `aggregator::run` prunes the edges the issues name (spec.md
//! §4.3 step 7, §7 "Validation issue").
//!
//! Two of the five validators here are grounded directly on
//! `anibridge_mappings/core/validators.py` (`MappingOverlapValidator`,
//! `MappingOverflowValidator`); the other three —
//! [`range_syntax`], [`overlap_target_provider`], and [`unit_mismatch`] —
//! have no original counterpart and are built fresh from spec.md §4.5's
//! prose, in the same `Validator` shape.

mod overflow;
mod overlap_target_provider;
mod overlap_target_scope;
mod range_syntax;
mod unit_mismatch;

pub use overflow::OverflowValidator;
pub use overlap_target_provider::OverlapTargetProviderValidator;
pub use overlap_target_scope::OverlapTargetScopeValidator;
pub use range_syntax::RangeSyntaxValidator;
pub use unit_mismatch::UnitMismatchValidator;

use crate::graph::{EpisodeGraph, IdentifierGraph};
use crate::meta::MetaStore;
use crate::render::{build_source_map, SourceMap};
use serde_json::Value;
use std::collections::HashMap;

/// One validator finding (spec.md §4.5, §3 "Provenance event" siblings in
/// §7 "Validation issue").
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub validator: &'static str,
    pub message: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_range: Option<String>,
    pub target_range: Option<String>,
    pub details: Option<HashMap<String, Value>>,
}

impl ValidationIssue {
    pub fn new(validator: &'static str, message: impl Into<String>) -> Self {
        Self {
            validator,
            message: message.into(),
            source: None,
            target: None,
            source_range: None,
            target_range: None,
            details: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_source_range(mut self, range: impl Into<String>) -> Self {
        self.source_range = Some(range.into());
        self
    }

    pub fn with_target_range(mut self, range: impl Into<String>) -> Self {
        self.target_range = Some(range.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.get_or_insert_with(HashMap::new).insert(key.into(), value.into());
        self
    }
}

/// Shared read-only state every validator sees; `source_map` is built
/// once per validation pass (spec.md §4.5).
pub struct ValidationContext<'a> {
    pub episode_graph: &'a EpisodeGraph,
    pub meta_store: &'a MetaStore,
    pub id_graph: &'a IdentifierGraph,
    pub source_map: SourceMap,
}

impl<'a> ValidationContext<'a> {
    pub fn new(episode_graph: &'a EpisodeGraph, meta_store: &'a MetaStore, id_graph: &'a IdentifierGraph) -> Self {
        Self {
            episode_graph,
            meta_store,
            id_graph,
            source_map: build_source_map(episode_graph),
        }
    }
}

pub trait Validator {
    fn name(&self) -> &'static str;
    fn validate(&self, ctx: &ValidationContext) -> Vec<ValidationIssue>;
}

/// The default validator set, in the order spec.md §4.5 lists them.
/// Execution is independent per validator — order only affects the
/// order issues are reported in.
pub fn default_validators() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(RangeSyntaxValidator),
        Box::new(OverlapTargetScopeValidator),
        Box::new(OverlapTargetProviderValidator),
        Box::new(OverflowValidator),
        Box::new(UnitMismatchValidator),
    ]
}

/// Run every validator in `validators` against `ctx` and concatenate
/// their issues in validator-declaration order.
pub fn run_all(validators: &[Box<dyn Validator>], ctx: &ValidationContext) -> Vec<ValidationIssue> {
    validators.iter().flat_map(|v| v.validate(ctx)).collect()
}
