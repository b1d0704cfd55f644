//! Error types for Seamflow.
//!
//! Only genuinely fatal conditions surface as [`SeamflowError`]: broken
//! configuration, structurally invalid input records, and I/O or
//! serialization failures. Everything the engine can keep working through
//! (unresolved targets, ambiguous resolutions, traversal cutoffs) is
//! accumulated as [`crate::diagnostics::Diagnostics`] instead.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SeamflowError>;

/// Fatal engine errors. A value of this type aborts the run before any
/// stage artifact is persisted.
#[derive(Debug, Error)]
pub enum SeamflowError {
    /// A required configuration bound is missing, zero, or otherwise
    /// unusable. The engine never runs with an unbounded traversal.
    #[error("configuration error: {0}")]
    Config(String),

    /// An input record is missing a required field. The whole run aborts on
    /// the first malformed record rather than producing a partial graph.
    #[error("malformed input record #{index} ({id:?}): {reason}")]
    MalformedInput {
        /// Zero-based position of the record in the input collection.
        index: usize,
        /// The record's id, or an empty string when the id itself is missing.
        id: String,
        /// Which required field failed validation.
        reason: String,
    },

    /// A stage input artifact does not exist or carries the wrong stage tag.
    #[error("stage input error: {0}")]
    StageInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
