//! Stage 5: sliding test-scope windows.
//!
//! Every flow of sufficient length is sliced into contiguous sub-sequences:
//! all lengths from the configured minimum up to the effective maximum, each
//! sliding by one position. Coverage is exact, with no duplicates: a flow of
//! length `L` yields `L - len + 1` windows for each admitted length `len`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SeamflowError};
use crate::flow::{Flow, NodeSummary};

/// Stage tag written into (and expected from) the Stage 5 artifact.
pub const STAGE5_TAG: &str = "stage5-test-windows";

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Where a window begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub point_id: String,
    pub unit: String,
    pub callable: String,
}

/// Where a window ends. `is_boundary` tells a test generator whether the
/// window's last seam crosses out of the analyzed scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowExit {
    pub point_id: String,
    pub unit: String,
    pub callable: String,
    pub target: String,
    pub is_boundary: bool,
}

/// One bounded test scope sliced from a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// `WINDOW_00001`-style id, sequential across the whole run.
    pub window_id: String,
    pub source_flow_id: String,
    pub start_position: usize,
    pub length: usize,
    pub integration_ids: Vec<String>,
    pub entry_point: WindowEntry,
    pub exit_point: WindowExit,
    pub description: String,
}

/// Per-run window accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStats {
    pub flows_processed: usize,
    pub flows_too_short: usize,
    pub windows_emitted: usize,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Slice every flow into sliding windows.
pub fn generate_windows(
    flows: &[Flow],
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> (Vec<Window>, WindowStats) {
    let mut windows = Vec::new();
    let mut stats = WindowStats::default();

    for flow in flows {
        stats.flows_processed += 1;
        let flow_length = flow.point_ids.len();
        if flow_length < config.min_window_length {
            stats.flows_too_short += 1;
            diagnostics.flows_too_short += 1;
            continue;
        }

        let effective_max = config.effective_max_window(flow_length);
        for length in config.min_window_length..=effective_max {
            for start in 0..=(flow_length - length) {
                let window_id = format!("WINDOW_{:05}", windows.len() + 1);
                windows.push(slice_window(flow, window_id, start, length));
            }
        }
    }

    stats.windows_emitted = windows.len();
    info!(
        flows = stats.flows_processed,
        too_short = stats.flows_too_short,
        windows = stats.windows_emitted,
        "window generation complete"
    );

    (windows, stats)
}

fn slice_window(flow: &Flow, window_id: String, start: usize, length: usize) -> Window {
    let end = start + length - 1;
    let entry = summary_at(flow, start);
    let exit = summary_at(flow, end);

    let description = format!(
        "{} seams from {} at position {}: {}.{} -> {}.{}",
        length, flow.flow_id, start, entry.unit, entry.callable, exit.unit, exit.callable
    );

    Window {
        window_id,
        source_flow_id: flow.flow_id.clone(),
        start_position: start,
        length,
        integration_ids: flow.point_ids[start..=end].to_vec(),
        entry_point: WindowEntry {
            point_id: entry.id,
            unit: entry.unit,
            callable: entry.callable,
        },
        exit_point: WindowExit {
            point_id: exit.id,
            unit: exit.unit,
            callable: exit.callable,
            target: exit.target,
            is_boundary: exit.is_boundary,
        },
        description,
    }
}

/// Node summary at a flow position, tolerating artifacts written without a
/// sequence section.
fn summary_at(flow: &Flow, index: usize) -> NodeSummary {
    match flow.sequence.get(index) {
        Some(summary) => summary.clone(),
        None => NodeSummary {
            id: flow.point_ids.get(index).cloned().unwrap_or_default(),
            unit: String::new(),
            callable: String::new(),
            target: String::new(),
            is_boundary: false,
        },
    }
}

// ---------------------------------------------------------------------------
// Stage 5 artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMetadata {
    pub total_windows: usize,
    pub flows_processed: usize,
    pub flows_too_short: usize,
    pub min_window_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_window_length: Option<usize>,
}

/// Persisted output of Stage 5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage5Artifact {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub metadata: WindowMetadata,
    #[serde(default)]
    pub windows: Vec<Window>,
}

impl Stage5Artifact {
    pub fn build(windows: Vec<Window>, stats: &WindowStats, config: &EngineConfig) -> Self {
        Self {
            stage: STAGE5_TAG.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            metadata: WindowMetadata {
                total_windows: windows.len(),
                flows_processed: stats.flows_processed,
                flows_too_short: stats.flows_too_short,
                min_window_length: config.min_window_length,
                max_window_length: config.max_window_length,
            },
            windows,
        }
    }

    pub fn check_tag(&self) -> Result<()> {
        if self.stage != STAGE5_TAG {
            return Err(SeamflowError::StageInput(format!(
                "expected {STAGE5_TAG} artifact, found stage tag {:?}",
                self.stage
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
