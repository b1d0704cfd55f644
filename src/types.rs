//! Core domain types for Seamflow.
//!
//! An [`IntegrationPoint`] is one observed seam: a call, construction,
//! dispatch, or external-boundary crossing recorded by the upstream ledger
//! producer. The engine never re-derives point ids: the `id` field is the
//! join key for every downstream graph, flow, and window reference.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IntegrationKind
// ---------------------------------------------------------------------------

/// What kind of seam this integration point records.
///
/// Closed enumeration with an `Other` member so that new ledger kinds
/// deserialize without breaking the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationKind {
    #[default]
    Call,
    Construct,
    Import,
    Dispatch,
    Io,
    #[serde(other)]
    Other,
}

impl IntegrationKind {
    /// Canonical string representation matching the ledger serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Construct => "construct",
            Self::Import => "import",
            Self::Dispatch => "dispatch",
            Self::Io => "io",
            Self::Other => "other",
        }
    }

    /// Parse from a string (case-insensitive). Unknown kinds map to `Other`.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "call" => Self::Call,
            "construct" | "constructor" | "new" => Self::Construct,
            "import" => Self::Import,
            "dispatch" => Self::Dispatch,
            "io" => Self::Io,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BoundaryKind
// ---------------------------------------------------------------------------

/// External system a boundary seam crosses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    Filesystem,
    Network,
    Database,
    Subprocess,
    MessageBus,
    Clock,
    Randomness,
    Env,
    #[serde(other)]
    Other,
}

impl BoundaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Network => "network",
            Self::Database => "database",
            Self::Subprocess => "subprocess",
            Self::MessageBus => "message_bus",
            Self::Clock => "clock",
            Self::Randomness => "randomness",
            Self::Env => "env",
            Self::Other => "other",
        }
    }

    /// Parse from a string (case-insensitive, hyphens accepted).
    /// Unknown kinds map to `Other`.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "filesystem" | "fs" | "file" => Self::Filesystem,
            "network" | "http" | "net" => Self::Network,
            "database" | "db" => Self::Database,
            "subprocess" | "process" | "exec" => Self::Subprocess,
            "message_bus" | "queue" => Self::MessageBus,
            "clock" | "time" => Self::Clock,
            "randomness" | "random" | "rng" => Self::Randomness,
            "env" | "environment" => Self::Env,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Boundary
// ---------------------------------------------------------------------------

/// Descriptor of an external-system crossing.
///
/// A point carrying a boundary is a terminal node in flow enumeration
/// (unless `boundaries_are_terminal` is disabled in the config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub kind: BoundaryKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl Boundary {
    /// Boundary with only a kind, no transport details.
    pub fn of_kind(kind: BoundaryKind) -> Self {
        Self {
            kind,
            protocol: None,
            system: None,
            endpoint: None,
            operation: None,
            resource: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution types
// ---------------------------------------------------------------------------

/// How a target string was matched to a source callable.
///
/// Ranked most-specific first; the Graph Builder stops at the first strategy
/// that produces any match, and every edge records which one it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// `target_raw` equals another point's `source_callable_id`.
    ExactCallableId,
    /// `target_raw` equals another point's `source_callable_name`.
    ExactCallableName,
    /// `target_raw` ends with `"." + source_callable_name`.
    QualifiedSuffix,
    /// Some `.`-delimited segment of `target_raw` equals the callable name.
    QualifiedSegment,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactCallableId => "exact_callable_id",
            Self::ExactCallableName => "exact_callable_name",
            Self::QualifiedSuffix => "qualified_suffix",
            Self::QualifiedSegment => "qualified_segment",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome status of resolving one target string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Resolved,
    Ambiguous,
    Unresolved,
}

/// Per-point resolution summary, populated by the Graph Builder (never by
/// the store). `matches` lists the candidate callables for ambiguous
/// targets so ambiguity is reportable, not silently collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResolution {
    pub status: ResolutionStatus,
    pub raw: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ResolutionMethod>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callable_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TargetResolution {
    pub fn unresolved(raw: impl Into<String>) -> Self {
        Self {
            status: ResolutionStatus::Unresolved,
            raw: raw.into(),
            method: None,
            callable_ids: Vec::new(),
            matches: Vec::new(),
            note: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Role of a point in flow enumeration, assigned once per run by the
/// Classifier and immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No known caller reaches this point's source callable.
    Entry,
    /// Has both a known caller path in and a resolvable target out.
    Intermediate,
    /// Crosses an external boundary, or its target resolves to nothing
    /// inside the analyzed scope.
    Terminal,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Intermediate => "intermediate",
            Self::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// IntegrationPoint
// ---------------------------------------------------------------------------

/// One observed seam from the unit ledgers.
///
/// All fields deserialize leniently (missing required fields become empty
/// strings) so the store can report malformed records with their index and
/// field name instead of a bare serde error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPoint {
    /// Globally unique integration id, e.g. `IC000F001E0004`.
    #[serde(default)]
    pub id: String,

    /// Unit (module/package) containing the caller.
    #[serde(default)]
    pub source_unit: String,

    /// Stable id of the callable containing this seam.
    #[serde(default)]
    pub source_callable_id: String,

    /// Human-readable name of the containing callable.
    #[serde(default)]
    pub source_callable_name: String,

    /// Unresolved textual reference to the callee, as recorded in the ledger.
    #[serde(rename = "target", default)]
    pub target_raw: String,

    /// Resolution summary, absent until the Graph Builder computes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_resolved: Option<TargetResolution>,

    #[serde(default)]
    pub kind: IntegrationKind,

    /// Ordered execution-item id sequences needed to reach this seam inside
    /// its own callable. Informational; never traversed by this engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execution_paths: Vec<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Boundary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IntegrationPoint {
    /// Minimal point for construction in tests and builders.
    pub fn new(
        id: impl Into<String>,
        source_unit: impl Into<String>,
        source_callable_id: impl Into<String>,
        source_callable_name: impl Into<String>,
        target_raw: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_unit: source_unit.into(),
            source_callable_id: source_callable_id.into(),
            source_callable_name: source_callable_name.into(),
            target_raw: target_raw.into(),
            target_resolved: None,
            kind: IntegrationKind::Call,
            execution_paths: Vec::new(),
            condition: None,
            boundary: None,
            signature: None,
            notes: None,
        }
    }

    /// Attach a boundary descriptor (builder style, used heavily in tests).
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn with_kind(mut self, kind: IntegrationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this seam crosses an external boundary.
    pub fn is_boundary(&self) -> bool {
        self.boundary.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
