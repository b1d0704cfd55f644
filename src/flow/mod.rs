//! Stage 4: flow enumeration types.
//!
//! A flow is one acyclic root-to-end path through the integration graph,
//! starting at an entry point and ending for a recorded reason. The reasons
//! are never conflated: a flow that stopped at the depth bound says so, and
//! downstream consumers can treat it differently from one that reached a
//! genuine terminal.

pub mod enumerate;

pub use enumerate::enumerate_flows;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeamflowError};
use crate::graph::{GraphNode, IntegrationGraph};

/// Stage tag written into (and expected from) the Stage 4 artifact.
pub const STAGE4_TAG: &str = "stage4-flows";

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Why a flow ended where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The last point is a terminal node.
    Terminal,
    /// The depth bound stopped the walk; the flow is truncated.
    DepthLimit,
    /// The last point has no unvisited successors.
    DeadEnd,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::DepthLimit => "depth_limit",
            Self::DeadEnd => "dead_end",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact per-point view carried inside flows so Stage 5 can run from the
/// Stage 4 artifact alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub unit: String,
    pub callable: String,
    pub target: String,
    pub is_boundary: bool,
}

impl NodeSummary {
    pub fn from_node(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            unit: node.unit.clone(),
            callable: node.callable_name.clone(),
            target: node.target.clone(),
            is_boundary: node.is_boundary,
        }
    }
}

/// Where a flow starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointInfo {
    pub point_id: String,
    pub unit: String,
    pub callable: String,
}

/// One enumerated flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// `FLOW_0001`-style id, assigned after the deterministic merge.
    pub flow_id: String,
    pub entry_point: EntryPointInfo,
    pub length: usize,
    pub point_ids: Vec<String>,
    pub termination: TerminationReason,
    pub sequence: Vec<NodeSummary>,
}

impl Flow {
    pub fn is_truncated(&self) -> bool {
        self.termination == TerminationReason::DepthLimit
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Traversal accounting for one entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStats {
    pub entry_id: String,
    pub paths_explored: usize,
    pub flows_emitted: usize,
    pub depth_limit_hits: usize,
    pub flow_limit_reached: bool,
    pub path_limit_reached: bool,
    /// Stack frames abandoned when a per-entry bound tripped.
    pub paths_cut_off: usize,
}

/// Whole-run traversal accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationStats {
    pub entries_processed: usize,
    pub paths_explored: usize,
    pub flows_emitted: usize,
    pub terminal_flows: usize,
    pub truncated_flows: usize,
    pub dead_end_flows: usize,
    pub depth_limit_hits: usize,
    pub entries_flow_limited: usize,
    pub entries_path_limited: usize,
    pub paths_cut_off: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub per_entry: Vec<EntryStats>,
}

// ---------------------------------------------------------------------------
// Stage 4 artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetadata {
    pub total_flows: usize,
    pub terminal_flows: usize,
    pub truncated_flows: usize,
    pub dead_end_flows: usize,
    pub entry_points: usize,
    pub paths_explored: usize,
    pub paths_cut_off: usize,
}

/// Persisted output of Stage 4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage4Artifact {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub metadata: FlowMetadata,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_stats: Vec<EntryStats>,
}

impl Stage4Artifact {
    pub fn build(flows: Vec<Flow>, stats: &EnumerationStats) -> Self {
        Self {
            stage: STAGE4_TAG.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            metadata: FlowMetadata {
                total_flows: flows.len(),
                terminal_flows: stats.terminal_flows,
                truncated_flows: stats.truncated_flows,
                dead_end_flows: stats.dead_end_flows,
                entry_points: stats.entries_processed,
                paths_explored: stats.paths_explored,
                paths_cut_off: stats.paths_cut_off,
            },
            flows,
            entry_stats: stats.per_entry.clone(),
        }
    }

    pub fn check_tag(&self) -> Result<()> {
        if self.stage != STAGE4_TAG {
            return Err(SeamflowError::StageInput(format!(
                "expected {STAGE4_TAG} artifact, found stage tag {:?}",
                self.stage
            )));
        }
        Ok(())
    }
}

/// Entry-point summary for a node known to be in the graph.
pub(crate) fn entry_info(graph: &IntegrationGraph, id: &str) -> EntryPointInfo {
    match graph.node(id) {
        Some(node) => EntryPointInfo {
            point_id: node.id.clone(),
            unit: node.unit.clone(),
            callable: node.callable_name.clone(),
        },
        None => EntryPointInfo {
            point_id: id.to_string(),
            unit: String::new(),
            callable: String::new(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
