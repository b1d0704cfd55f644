//! Stage sequencing and artifact persistence.
//!
//! A full run executes the five stages in strict order, writing each stage's
//! YAML artifact only after that stage completes. Single-stage mode re-runs
//! one stage from its predecessor's persisted artifact, so expensive stages
//! can be iterated without recomputing the whole pipeline.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::classify::{classify, ClassificationResult, Stage2Artifact};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostics, RunSummary};
use crate::error::{Result, SeamflowError};
use crate::flow::{enumerate_flows, Stage4Artifact};
use crate::graph::resolve::CallableIndex;
use crate::graph::{build_graph, IntegrationGraph, Stage3Artifact};
use crate::store::{PointStore, Stage1Artifact};
use crate::window::{generate_windows, Stage5Artifact};

/// Artifact filenames inside the output directory, stage order.
pub const STAGE1_FILE: &str = "stage1-integration-points.yaml";
pub const STAGE2_FILE: &str = "stage2-classified-points.yaml";
pub const STAGE3_FILE: &str = "stage3-integration-graph.yaml";
pub const STAGE4_FILE: &str = "stage4-flows.yaml";
pub const STAGE5_FILE: &str = "stage5-test-windows.yaml";

// ---------------------------------------------------------------------------
// RunOptions
// ---------------------------------------------------------------------------

/// Everything one pipeline invocation needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Input point collection. Required for a full run and for stage 1;
    /// later single stages read their predecessor artifact instead.
    pub points: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub config: EngineConfig,
    /// `None` runs all five stages in order.
    pub stage: Option<u8>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Execute the pipeline (or one stage of it) and return the run summary.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    std::fs::create_dir_all(&options.output_dir)?;

    match options.stage {
        None => run_all(options),
        Some(1) => {
            let store = load_store(options)?;
            save_yaml(&options.output_dir.join(STAGE1_FILE), &store.artifact())?;
            Ok(RunSummary {
                total_points: store.len(),
                ..Default::default()
            })
        }
        Some(2) => {
            let (store, _) = restore_store(&options.output_dir)?;
            let index = CallableIndex::build(&store);
            let classification = classify(&store, &index, &options.config);
            save_yaml(
                &options.output_dir.join(STAGE2_FILE),
                &classification.artifact(),
            )?;
            Ok(classify_summary(&store, &classification))
        }
        Some(3) => {
            let (store, classification) = restore_classification(&options.output_dir)?;
            let index = CallableIndex::build(&store);
            let mut diagnostics = Diagnostics::new();
            diagnostics.isolated_points = classification.isolated.clone();
            let graph = build_graph(&store, &index, &classification, &mut diagnostics);
            save_yaml(
                &options.output_dir.join(STAGE3_FILE),
                &graph.artifact(&diagnostics),
            )?;
            let mut summary = classify_summary(&store, &classification);
            summary.nodes = graph.node_count();
            summary.edges = graph.edge_count();
            summary.unresolved_targets = diagnostics.unresolved_count();
            summary.ambiguous_targets = diagnostics.ambiguous_count();
            Ok(summary)
        }
        Some(4) => {
            let graph = restore_graph(&options.output_dir)?;
            let (flows, stats) = enumerate_flows(&graph, &options.config);
            let artifact = Stage4Artifact::build(flows, &stats);
            save_yaml(&options.output_dir.join(STAGE4_FILE), &artifact)?;
            Ok(RunSummary {
                nodes: graph.node_count(),
                edges: graph.edge_count(),
                flows_total: artifact.flows.len(),
                flows_terminal: stats.terminal_flows,
                flows_truncated: stats.truncated_flows,
                flows_dead_end: stats.dead_end_flows,
                paths_explored: stats.paths_explored,
                paths_cut_off: stats.paths_cut_off,
                ..Default::default()
            })
        }
        Some(5) => {
            let flows = restore_flows(&options.output_dir)?;
            let mut diagnostics = Diagnostics::new();
            let (windows, stats) = generate_windows(&flows, &options.config, &mut diagnostics);
            let artifact = Stage5Artifact::build(windows, &stats, &options.config);
            save_yaml(&options.output_dir.join(STAGE5_FILE), &artifact)?;
            Ok(RunSummary {
                flows_total: flows.len(),
                windows_total: artifact.windows.len(),
                ..Default::default()
            })
        }
        Some(n) => Err(SeamflowError::Config(format!(
            "unknown stage {n}: expected 1..=5"
        ))),
    }
}

fn run_all(options: &RunOptions) -> Result<RunSummary> {
    let dir = &options.output_dir;
    let config = &options.config;

    // Stage 1
    let store = load_store(options)?;
    save_yaml(&dir.join(STAGE1_FILE), &store.artifact())?;

    // Stage 2
    let index = CallableIndex::build(&store);
    let classification = classify(&store, &index, config);
    save_yaml(&dir.join(STAGE2_FILE), &classification.artifact())?;

    // Stage 3
    let mut diagnostics = Diagnostics::new();
    diagnostics.isolated_points = classification.isolated.clone();
    let graph = build_graph(&store, &index, &classification, &mut diagnostics);
    save_yaml(&dir.join(STAGE3_FILE), &graph.artifact(&diagnostics))?;

    // Stage 4
    let (flows, flow_stats) = enumerate_flows(&graph, config);
    let stage4 = Stage4Artifact::build(flows, &flow_stats);
    save_yaml(&dir.join(STAGE4_FILE), &stage4)?;

    // Stage 5
    let (windows, window_stats) = generate_windows(&stage4.flows, config, &mut diagnostics);
    let stage5 = Stage5Artifact::build(windows, &window_stats, config);
    save_yaml(&dir.join(STAGE5_FILE), &stage5)?;

    let mut summary = classify_summary(&store, &classification);
    summary.nodes = graph.node_count();
    summary.edges = graph.edge_count();
    summary.flows_total = stage4.flows.len();
    summary.flows_terminal = flow_stats.terminal_flows;
    summary.flows_truncated = flow_stats.truncated_flows;
    summary.flows_dead_end = flow_stats.dead_end_flows;
    summary.windows_total = stage5.windows.len();
    summary.unresolved_targets = diagnostics.unresolved_count();
    summary.ambiguous_targets = diagnostics.ambiguous_count();
    summary.paths_explored = flow_stats.paths_explored;
    summary.paths_cut_off = flow_stats.paths_cut_off;

    info!(output_dir = %dir.display(), "pipeline complete");
    Ok(summary)
}

fn classify_summary(store: &PointStore, classification: &ClassificationResult) -> RunSummary {
    RunSummary {
        total_points: store.len(),
        entry_points: classification.entry_count(),
        intermediate_seams: classification.intermediate_count(),
        terminal_nodes: classification.terminal_count(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Artifact restore
// ---------------------------------------------------------------------------

fn load_store(options: &RunOptions) -> Result<PointStore> {
    let points_path = options.points.as_ref().ok_or_else(|| {
        SeamflowError::Config("--points is required for a full run or stage 1".into())
    })?;
    PointStore::load(points_path)
}

fn restore_store(dir: &Path) -> Result<(PointStore, Stage1Artifact)> {
    let artifact: Stage1Artifact = load_artifact(&dir.join(STAGE1_FILE))?;
    artifact.check_tag()?;
    let store = PointStore::from_points(artifact.integration_points.clone())?;
    Ok((store, artifact))
}

fn restore_classification(dir: &Path) -> Result<(PointStore, ClassificationResult)> {
    let artifact: Stage2Artifact = load_artifact(&dir.join(STAGE2_FILE))?;
    artifact.check_tag()?;
    let points = artifact
        .classified_points
        .iter()
        .map(|c| c.point.clone())
        .collect();
    let store = PointStore::from_points(points)?;
    Ok((store, artifact.into_result()))
}

fn restore_graph(dir: &Path) -> Result<IntegrationGraph> {
    let artifact: Stage3Artifact = load_artifact(&dir.join(STAGE3_FILE))?;
    artifact.check_tag()?;
    Ok(artifact.into_graph())
}

fn restore_flows(dir: &Path) -> Result<Vec<crate::flow::Flow>> {
    let artifact: Stage4Artifact = load_artifact(&dir.join(STAGE4_FILE))?;
    artifact.check_tag()?;
    Ok(artifact.flows)
}

// ---------------------------------------------------------------------------
// YAML persistence
// ---------------------------------------------------------------------------

fn save_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_yaml::to_string(value)?;
    std::fs::write(path, text)?;
    info!("wrote {}", path.display());
    Ok(())
}

fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SeamflowError::StageInput(format!(
                "missing predecessor artifact {}: run the earlier stage first",
                path.display()
            ))
        } else {
            SeamflowError::Io(e)
        }
    })?;
    Ok(serde_yaml::from_str(&text)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
