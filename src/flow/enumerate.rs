//! Bounded depth-first flow enumeration.
//!
//! Each entry point is walked with an explicit stack of partial paths. A
//! path never revisits a point, so cycles in the graph cannot hang the walk.
//! Three finite bounds cap the work per entry: maximum depth, maximum flows
//! emitted, and maximum paths explored. Tripping a bound stops that entry's
//! walk and is counted, never silently dropped.
//!
//! Entries are processed in parallel and merged in sorted-entry-id order,
//! after which flow ids are assigned sequentially, so the output is
//! byte-identical across runs regardless of scheduling.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use crate::config::EngineConfig;
use crate::flow::{entry_info, EntryStats, EnumerationStats, Flow, NodeSummary, TerminationReason};
use crate::graph::IntegrationGraph;

/// Enumerate all flows from every entry point in the graph.
pub fn enumerate_flows(
    graph: &IntegrationGraph,
    config: &EngineConfig,
) -> (Vec<Flow>, EnumerationStats) {
    let mut entries: Vec<&str> = graph.entry_ids();
    entries.sort_unstable();

    let progress = if config.show_progress && !entries.is_empty() {
        let bar = ProgressBar::new(entries.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} entry points")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let per_entry: Vec<(Vec<Vec<String>>, Vec<TerminationReason>, EntryStats)> = entries
        .par_iter()
        .map(|entry_id| {
            let result = enumerate_entry(graph, entry_id, config);
            progress.inc(1);
            result
        })
        .collect();
    progress.finish_and_clear();

    let mut flows = Vec::new();
    let mut stats = EnumerationStats {
        entries_processed: entries.len(),
        ..Default::default()
    };

    for (entry_id, (paths, terminations, entry_stats)) in entries.iter().zip(per_entry) {
        for (path, termination) in paths.into_iter().zip(terminations) {
            let flow_id = format!("FLOW_{:04}", flows.len() + 1);
            let sequence: Vec<NodeSummary> = path
                .iter()
                .filter_map(|id| graph.node(id).map(NodeSummary::from_node))
                .collect();
            match termination {
                TerminationReason::Terminal => stats.terminal_flows += 1,
                TerminationReason::DepthLimit => stats.truncated_flows += 1,
                TerminationReason::DeadEnd => stats.dead_end_flows += 1,
            }
            flows.push(Flow {
                flow_id,
                entry_point: entry_info(graph, entry_id),
                length: path.len(),
                point_ids: path,
                termination,
                sequence,
            });
        }

        stats.paths_explored += entry_stats.paths_explored;
        stats.flows_emitted += entry_stats.flows_emitted;
        stats.depth_limit_hits += entry_stats.depth_limit_hits;
        stats.paths_cut_off += entry_stats.paths_cut_off;
        if entry_stats.flow_limit_reached {
            stats.entries_flow_limited += 1;
        }
        if entry_stats.path_limit_reached {
            stats.entries_path_limited += 1;
        }
        stats.per_entry.push(entry_stats);
    }

    info!(
        entries = stats.entries_processed,
        flows = flows.len(),
        terminal = stats.terminal_flows,
        truncated = stats.truncated_flows,
        dead_end = stats.dead_end_flows,
        paths_explored = stats.paths_explored,
        "flow enumeration complete"
    );

    (flows, stats)
}

/// Walk one entry point. Returns emitted paths, their termination reasons
/// (index-aligned), and the traversal accounting.
fn enumerate_entry(
    graph: &IntegrationGraph,
    entry_id: &str,
    config: &EngineConfig,
) -> (Vec<Vec<String>>, Vec<TerminationReason>, EntryStats) {
    let mut stats = EntryStats {
        entry_id: entry_id.to_string(),
        ..Default::default()
    };
    let mut paths = Vec::new();
    let mut terminations = Vec::new();

    let mut stack: Vec<Vec<String>> = vec![vec![entry_id.to_string()]];

    while !stack.is_empty() {
        if stats.flows_emitted >= config.max_flows_per_entry {
            stats.flow_limit_reached = true;
            stats.paths_cut_off += stack.len();
            break;
        }
        if stats.paths_explored >= config.max_paths_explored_per_entry {
            stats.path_limit_reached = true;
            stats.paths_cut_off += stack.len();
            break;
        }

        let Some(path) = stack.pop() else { break };
        stats.paths_explored += 1;
        let Some(current) = path.last().cloned() else {
            continue;
        };

        // Terminal wins over the depth bound when both apply at once.
        if graph.is_terminal(&current) {
            stats.flows_emitted += 1;
            paths.push(path);
            terminations.push(TerminationReason::Terminal);
            continue;
        }
        if path.len() >= config.max_flow_depth {
            stats.flows_emitted += 1;
            stats.depth_limit_hits += 1;
            paths.push(path);
            terminations.push(TerminationReason::DepthLimit);
            continue;
        }

        let next: Vec<&str> = graph
            .successors(&current)
            .into_iter()
            .filter(|s| !path.iter().any(|p| p == s))
            .collect();

        if next.is_empty() {
            stats.flows_emitted += 1;
            paths.push(path);
            terminations.push(TerminationReason::DeadEnd);
            continue;
        }

        // Reverse push so the first edge is explored first.
        for successor in next.into_iter().rev() {
            let mut extended = path.clone();
            extended.push(successor.to_string());
            stack.push(extended);
        }
    }

    (paths, terminations, stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
