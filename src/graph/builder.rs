//! Stage 3 construction: materialize edges from resolved targets.
//!
//! Every point becomes a node regardless of how its target resolves. Edges
//! are created from a point to every point inside each callable its target
//! resolved to, in store order, so edge order is stable across runs. Edge
//! creation ignores classification: a terminal node may still carry outgoing
//! edges, and traversal simply stops at it.

use tracing::{debug, info};

use crate::classify::ClassificationResult;
use crate::diagnostics::{AmbiguousResolution, Diagnostics, UnresolvedTarget};
use crate::graph::resolve::{resolve_target, CallableIndex, Resolution};
use crate::graph::{GraphEdge, GraphNode, IntegrationGraph};
use crate::store::PointStore;

/// Build the integration graph, accumulating resolution findings.
pub fn build_graph(
    store: &PointStore,
    index: &CallableIndex,
    classification: &ClassificationResult,
    diagnostics: &mut Diagnostics,
) -> IntegrationGraph {
    let mut nodes = Vec::with_capacity(store.len());
    let mut edges = Vec::new();

    for (point, classified) in store.points().iter().zip(&classification.classified) {
        nodes.push(GraphNode {
            id: point.id.clone(),
            unit: point.source_unit.clone(),
            callable_id: point.source_callable_id.clone(),
            callable_name: point.source_callable_name.clone(),
            target: point.target_raw.clone(),
            kind: point.kind,
            classification: classified.classification,
            is_boundary: point.is_boundary(),
            resolution: classified.point.target_resolved.clone(),
        });

        let resolution = resolve_target(index, &point.target_raw);
        match &resolution {
            Resolution::Unresolved => {
                if !point.target_raw.trim().is_empty() {
                    diagnostics.unresolved.push(UnresolvedTarget {
                        point_id: point.id.clone(),
                        target: point.target_raw.clone(),
                    });
                }
            }
            Resolution::AmbiguousBare { matches, .. } => {
                debug!(
                    point = %point.id,
                    target = %point.target_raw,
                    candidates = matches.len(),
                    "bare ambiguous target, no edges created"
                );
                diagnostics.ambiguous.push(AmbiguousResolution {
                    point_id: point.id.clone(),
                    target: point.target_raw.clone(),
                    matches: qualified_matches(index, matches),
                    bare: true,
                });
            }
            Resolution::Matched {
                method,
                callable_ids,
                ambiguous,
            } => {
                if *ambiguous {
                    diagnostics.ambiguous.push(AmbiguousResolution {
                        point_id: point.id.clone(),
                        target: point.target_raw.clone(),
                        matches: qualified_matches(index, callable_ids),
                        bare: false,
                    });
                }
                for callable_id in callable_ids {
                    let Some(callable) = index.get(callable_id) else {
                        continue;
                    };
                    for &point_index in &callable.point_indices {
                        let to = &store.points()[point_index];
                        // A point targeting its own callable would link to
                        // itself; self-loops carry no flow information.
                        if to.id == point.id {
                            continue;
                        }
                        edges.push(GraphEdge {
                            from: point.id.clone(),
                            to: to.id.clone(),
                            method: *method,
                            reason: format!(
                                "target {:?} resolved to callable {} ({}) via {}",
                                point.target_raw, callable.callable_id, callable.name, method
                            ),
                        });
                    }
                }
            }
        }
    }

    let graph = IntegrationGraph::new(nodes, edges);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        unresolved = diagnostics.unresolved_count(),
        ambiguous = diagnostics.ambiguous_count(),
        "built integration graph"
    );
    graph
}

fn qualified_matches(index: &CallableIndex, callable_ids: &[String]) -> Vec<String> {
    callable_ids
        .iter()
        .filter_map(|id| index.get(id).map(|c| c.qualified()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::config::EngineConfig;
    use crate::types::{Boundary, BoundaryKind, IntegrationPoint, ResolutionMethod};
    use pretty_assertions::assert_eq as pa_eq;

    fn point(id: &str, unit: &str, callable_id: &str, name: &str, target: &str) -> IntegrationPoint {
        IntegrationPoint::new(id, unit, callable_id, name, target)
    }

    fn build(points: Vec<IntegrationPoint>) -> (IntegrationGraph, Diagnostics) {
        let store = PointStore::from_points(points).unwrap();
        let index = CallableIndex::build(&store);
        let classification = classify(&store, &index, &EngineConfig::default());
        let mut diagnostics = Diagnostics::new();
        let graph = build_graph(&store, &index, &classification, &mut diagnostics);
        (graph, diagnostics)
    }

    #[test]
    fn chain_produces_one_edge_per_link() {
        let (graph, diagnostics) = build(vec![
            point("IP001", "api", "C001", "handle", "orders.process"),
            point("IP002", "orders", "C002", "process", "db.save"),
            point("IP003", "db", "C003", "save", "")
                .with_boundary(Boundary::of_kind(BoundaryKind::Database)),
        ]);
        pa_eq!(graph.node_count(), 3);
        pa_eq!(graph.edge_count(), 2);
        pa_eq!(graph.successors("IP001"), vec!["IP002"]);
        pa_eq!(graph.successors("IP002"), vec!["IP003"]);
        pa_eq!(diagnostics.unresolved_count(), 0);
    }

    #[test]
    fn multiple_seams_in_target_callable_fan_out() {
        // C002 contains two seams; resolving into it yields two edges.
        let (graph, _) = build(vec![
            point("IP001", "api", "C001", "handle", "orders.process"),
            point("IP002", "orders", "C002", "process", "db.save"),
            point("IP003", "orders", "C002", "process", "audit.log_row"),
            point("IP004", "db", "C003", "save", "")
                .with_boundary(Boundary::of_kind(BoundaryKind::Database)),
            point("IP005", "audit", "C004", "log_row", "")
                .with_boundary(Boundary::of_kind(BoundaryKind::Filesystem)),
        ]);
        pa_eq!(graph.successors("IP001"), vec!["IP002", "IP003"]);
    }

    #[test]
    fn bare_ambiguous_target_creates_no_edges() {
        let (graph, diagnostics) = build(vec![
            point("IP001", "api", "C001", "handle", "process"),
            point("IP002", "orders", "C010", "process", "a.absent"),
            point("IP003", "refunds", "C020", "process", "b.absent"),
        ]);
        pa_eq!(graph.successors("IP001"), Vec::<&str>::new());
        pa_eq!(diagnostics.ambiguous_count(), 1);
        assert!(diagnostics.ambiguous[0].bare);
        pa_eq!(
            diagnostics.ambiguous[0].matches,
            vec!["orders::C010".to_string(), "refunds::C020".to_string()]
        );
    }

    #[test]
    fn qualified_ambiguous_target_fans_out_with_diagnostic() {
        let (graph, diagnostics) = build(vec![
            point("IP001", "api", "C001", "handle", "jobs.process"),
            point("IP002", "orders", "C010", "process", "a.absent"),
            point("IP003", "refunds", "C020", "process", "b.absent"),
        ]);
        pa_eq!(graph.successors("IP001"), vec!["IP002", "IP003"]);
        pa_eq!(diagnostics.ambiguous_count(), 1);
        assert!(!diagnostics.ambiguous[0].bare);
    }

    #[test]
    fn unresolved_target_recorded_once() {
        let (graph, diagnostics) = build(vec![
            point("IP001", "api", "C001", "handle", "ghost.vanish"),
            point("IP002", "orders", "C002", "process", "api.handle"),
        ]);
        pa_eq!(graph.successors("IP001"), Vec::<&str>::new());
        pa_eq!(diagnostics.unresolved_count(), 1);
        pa_eq!(diagnostics.unresolved[0].target, "ghost.vanish");
    }

    #[test]
    fn boundary_point_with_empty_target_not_flagged_unresolved() {
        let (_, diagnostics) = build(vec![
            point("IP001", "api", "C001", "handle", "db.save"),
            point("IP002", "db", "C002", "save", "")
                .with_boundary(Boundary::of_kind(BoundaryKind::Database)),
        ]);
        pa_eq!(diagnostics.unresolved_count(), 0);
    }

    #[test]
    fn terminal_node_keeps_outgoing_edges() {
        // The boundary point's target still resolves; the edge exists even
        // though the node is terminal.
        let (graph, _) = build(vec![
            point("IP001", "api", "C001", "handle", "db.save"),
            point("IP002", "db", "C002", "save", "audit.log_row")
                .with_boundary(Boundary::of_kind(BoundaryKind::Database)),
            point("IP003", "audit", "C003", "log_row", "")
                .with_boundary(Boundary::of_kind(BoundaryKind::Filesystem)),
        ]);
        assert!(graph.is_terminal("IP002"));
        pa_eq!(graph.successors("IP002"), vec!["IP003"]);
    }

    #[test]
    fn self_loop_skipped() {
        let (graph, _) = build(vec![
            point("IP001", "math", "C001", "fib", "math.fib"),
            point("IP002", "api", "C002", "handle", "math.fib"),
        ]);
        // IP001 targets its own callable: no self edge, but IP002 still links in.
        pa_eq!(graph.successors("IP001"), Vec::<&str>::new());
        pa_eq!(graph.successors("IP002"), vec!["IP001"]);
    }

    #[test]
    fn edge_reason_names_method_and_callable() {
        let (graph, _) = build(vec![
            point("IP001", "api", "C001", "handle", "orders.process"),
            point("IP002", "orders", "C002", "process", "x.absent"),
        ]);
        let edge = graph.out_edges("IP001").next().unwrap();
        pa_eq!(edge.method, ResolutionMethod::QualifiedSuffix);
        assert!(edge.reason.contains("C002"));
        assert!(edge.reason.contains("qualified_suffix"));
    }
}
