//! Crate-wide error taxonomy.
//!
//! Mirrors the five error kinds from the design: parse errors (recovered
//! locally at source/edit boundaries), source errors (fatal to one source,
//! never the run), edit errors (abort the whole overlay step), and
//! invariant violations (fail fast, never recovered).

use thiserror::Error;

/// Top-level error type for pipeline-level failures.
#[derive(Debug, Error)]
pub enum MapFusionError {
    #[error("invalid descriptor: {0}")]
    Parse(String),

    #[error("source '{source}' failed: {message}")]
    Source { source: String, message: String },

    #[error("edits overlay aborted: {0}")]
    Edit(#[from] crate::edits::EditError),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MapFusionResult<T> = Result<T, MapFusionError>;

/// Fail-fast assertion for programmer-error invariants (spec.md §7:
/// "Runtime invariant violation"). Not used for any condition reachable
/// from untrusted input.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            panic!("invariant violated: {}", format!($($arg)*));
        }
    };
}
