//! Non-fatal findings and the end-of-run summary.
//!
//! The pipeline never aborts on unresolved targets, ambiguous resolutions,
//! or traversal cutoffs; it accumulates them here and attaches them to the
//! stage artifacts and the final summary, so an operator can judge artifact
//! quality without inspecting raw output.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// A target string that matched no known callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedTarget {
    pub point_id: String,
    pub target: String,
}

/// A target string that matched more than one distinct callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousResolution {
    pub point_id: String,
    pub target: String,
    /// Fully qualified candidates, `unit::callable_id` form.
    pub matches: Vec<String>,
    /// True when the target is a bare identifier (no `.` qualifier). Bare
    /// ambiguous targets create no edges and the point stays unresolved.
    pub bare: bool,
}

/// Accumulated non-fatal findings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedTarget>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguous: Vec<AmbiguousResolution>,

    /// Points satisfying both Entry and Terminal criteria (classified
    /// Terminal, boundary takes precedence).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isolated_points: Vec<String>,

    /// Flows skipped by the Window Generator for being shorter than the
    /// minimum window length.
    #[serde(default)]
    pub flows_too_short: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    pub fn ambiguous_count(&self) -> usize {
        self.ambiguous.len()
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Totals a successful run always reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_points: usize,
    pub entry_points: usize,
    pub intermediate_seams: usize,
    pub terminal_nodes: usize,
    pub nodes: usize,
    pub edges: usize,
    pub flows_total: usize,
    pub flows_terminal: usize,
    pub flows_truncated: usize,
    pub flows_dead_end: usize,
    pub windows_total: usize,
    pub unresolved_targets: usize,
    pub ambiguous_targets: usize,
    pub paths_explored: usize,
    pub paths_cut_off: usize,
}

impl RunSummary {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total_points": self.total_points,
            "entry_points": self.entry_points,
            "intermediate_seams": self.intermediate_seams,
            "terminal_nodes": self.terminal_nodes,
            "nodes": self.nodes,
            "edges": self.edges,
            "flows": {
                "total": self.flows_total,
                "terminal": self.flows_terminal,
                "truncated": self.flows_truncated,
                "dead_end": self.flows_dead_end,
            },
            "windows_total": self.windows_total,
            "unresolved_targets": self.unresolved_targets,
            "ambiguous_targets": self.ambiguous_targets,
            "paths_explored": self.paths_explored,
            "paths_cut_off": self.paths_cut_off,
        })
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "points: {} (entry {}, intermediate {}, terminal {})",
            self.total_points, self.entry_points, self.intermediate_seams, self.terminal_nodes
        )?;
        writeln!(f, "graph: {} nodes, {} edges", self.nodes, self.edges)?;
        writeln!(
            f,
            "flows: {} (terminal {}, truncated {}, dead-end {})",
            self.flows_total, self.flows_terminal, self.flows_truncated, self.flows_dead_end
        )?;
        writeln!(f, "windows: {}", self.windows_total)?;
        write!(
            f,
            "resolution: {} unresolved, {} ambiguous; traversal: {} paths explored, {} cut off",
            self.unresolved_targets, self.ambiguous_targets, self.paths_explored, self.paths_cut_off
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
