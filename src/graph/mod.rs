//! Stage 3: the integration graph.
//!
//! Nodes are integration points; a directed edge means "after this seam,
//! control can enter the callable containing that seam". Edges carry the
//! resolution method that produced them, so every link in a flow is
//! explainable back to a strategy.

pub mod builder;
pub mod resolve;

pub use builder::build_graph;
pub use resolve::{resolve_target, CallableIndex, Resolution};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{AmbiguousResolution, Diagnostics, UnresolvedTarget};
use crate::error::{Result, SeamflowError};
use crate::types::{Classification, IntegrationKind, ResolutionMethod, TargetResolution};

/// Stage tag written into (and expected from) the Stage 3 artifact.
pub const STAGE3_TAG: &str = "stage3-integration-graph";

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

/// One integration point as a graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub unit: String,
    pub callable_id: String,
    pub callable_name: String,
    pub target: String,
    pub kind: IntegrationKind,
    pub classification: Classification,
    pub is_boundary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<TargetResolution>,
}

/// One directed edge between two integration points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub method: ResolutionMethod,
    /// Human-readable provenance for the artifact.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// IntegrationGraph
// ---------------------------------------------------------------------------

/// The materialized call graph over integration points.
///
/// Node order follows store input order; edge order follows creation order.
/// Both orders are deterministic and drive flow enumeration.
#[derive(Debug, Clone)]
pub struct IntegrationGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    by_id: HashMap<String, usize>,
    /// Node id -> indices into `edges`, creation order.
    adjacency: HashMap<String, Vec<usize>>,
}

impl IntegrationGraph {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let by_id = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let mut adjacency: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            adjacency.entry(edge.from.clone()).or_default().push(i);
        }
        Self {
            nodes,
            edges,
            by_id,
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    /// Outgoing edges of a node, in creation order.
    pub fn out_edges(&self, id: &str) -> impl Iterator<Item = &GraphEdge> {
        self.adjacency
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&i| &self.edges[i])
    }

    /// Successor node ids, in edge creation order.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.out_edges(id).map(|e| e.to.as_str()).collect()
    }

    /// Node ids classified Entry, in node order.
    pub fn entry_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.classification == Classification::Entry)
            .map(|n| n.id.as_str())
            .collect()
    }

    pub fn is_terminal(&self, id: &str) -> bool {
        self.node(id)
            .is_some_and(|n| n.classification == Classification::Terminal)
    }

    /// Build the persisted Stage 3 artifact.
    pub fn artifact(&self, diagnostics: &Diagnostics) -> Stage3Artifact {
        Stage3Artifact {
            stage: STAGE3_TAG.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            metadata: GraphMetadata {
                total_nodes: self.node_count(),
                total_edges: self.edge_count(),
                entry_nodes: self.entry_ids().len(),
                terminal_nodes: self
                    .nodes
                    .iter()
                    .filter(|n| n.classification == Classification::Terminal)
                    .count(),
                unresolved_targets: diagnostics.unresolved_count(),
                ambiguous_targets: diagnostics.ambiguous_count(),
            },
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            unresolved: diagnostics.unresolved.clone(),
            ambiguous: diagnostics.ambiguous.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage 3 artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub entry_nodes: usize,
    pub terminal_nodes: usize,
    pub unresolved_targets: usize,
    pub ambiguous_targets: usize,
}

/// Persisted output of Stage 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage3Artifact {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub metadata: GraphMetadata,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedTarget>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguous: Vec<AmbiguousResolution>,
}

impl Stage3Artifact {
    pub fn check_tag(&self) -> Result<()> {
        if self.stage != STAGE3_TAG {
            return Err(SeamflowError::StageInput(format!(
                "expected {STAGE3_TAG} artifact, found stage tag {:?}",
                self.stage
            )));
        }
        Ok(())
    }

    /// Rebuild the in-memory graph from a persisted artifact.
    pub fn into_graph(self) -> IntegrationGraph {
        IntegrationGraph::new(self.nodes, self.edges)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
