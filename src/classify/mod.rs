//! Stage 2: Entry / Intermediate / Terminal classification.
//!
//! Every point gets exactly one role, decided Terminal-first:
//!
//! 1. Terminal when the point crosses an external boundary (and
//!    `boundaries_are_terminal` is set) or its target does not resolve to any
//!    known callable.
//! 2. Entry when no point's resolved target reaches the point's own source
//!    callable.
//! 3. Intermediate otherwise.
//!
//! A point meeting both the Terminal and Entry criteria classifies Terminal
//! and is recorded as isolated. Classification is a pure function of the
//! whole store, so it is order-independent and idempotent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Result, SeamflowError};
use crate::graph::resolve::{resolution_summary, resolve_target, CallableIndex};
use crate::store::PointStore;
use crate::types::{Classification, IntegrationPoint};

/// Stage tag written into (and expected from) the Stage 2 artifact.
pub const STAGE2_TAG: &str = "stage2-classified-points";

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// A point with its assigned role and resolution summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPoint {
    #[serde(flatten)]
    pub point: IntegrationPoint,
    pub classification: Classification,
}

/// Output of the classifier, input order preserved.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub classified: Vec<ClassifiedPoint>,
    pub entry_ids: Vec<String>,
    pub intermediate_ids: Vec<String>,
    pub terminal_ids: Vec<String>,
    /// Points that met both the Entry and the Terminal criteria.
    pub isolated: Vec<String>,
}

impl ClassificationResult {
    pub fn entry_count(&self) -> usize {
        self.entry_ids.len()
    }

    pub fn intermediate_count(&self) -> usize {
        self.intermediate_ids.len()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_ids.len()
    }

    pub fn classification_of(&self, point_id: &str) -> Option<Classification> {
        self.classified
            .iter()
            .find(|c| c.point.id == point_id)
            .map(|c| c.classification)
    }

    /// Build the persisted Stage 2 artifact.
    pub fn artifact(&self) -> Stage2Artifact {
        Stage2Artifact {
            stage: STAGE2_TAG.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            metadata: ClassifyMetadata {
                total_points: self.classified.len(),
                entry_points: self.entry_count(),
                intermediate_points: self.intermediate_count(),
                terminal_points: self.terminal_count(),
                isolated_points: self.isolated.len(),
            },
            entry_ids: self.entry_ids.clone(),
            intermediate_ids: self.intermediate_ids.clone(),
            terminal_ids: self.terminal_ids.clone(),
            isolated_ids: self.isolated.clone(),
            classified_points: self.classified.clone(),
        }
    }
}

/// Classify every point in the store.
pub fn classify(
    store: &PointStore,
    index: &CallableIndex,
    config: &EngineConfig,
) -> ClassificationResult {
    // Callables reachable as a resolved target of any point. Membership here
    // is what disqualifies a point from being an entry.
    let mut called_callables: HashSet<&str> = HashSet::new();
    let resolutions: Vec<_> = store
        .points()
        .iter()
        .map(|p| resolve_target(index, &p.target_raw))
        .collect();
    for resolution in &resolutions {
        for callable_id in resolution.callable_ids() {
            called_callables.insert(callable_id.as_str());
        }
    }

    let mut classified = Vec::with_capacity(store.len());
    let mut entry_ids = Vec::new();
    let mut intermediate_ids = Vec::new();
    let mut terminal_ids = Vec::new();
    let mut isolated = Vec::new();

    for (point, resolution) in store.points().iter().zip(&resolutions) {
        let is_terminal = (point.is_boundary() && config.boundaries_are_terminal)
            || !resolution.is_resolved();
        let is_entry = !called_callables.contains(point.source_callable_id.as_str());

        let classification = if is_terminal {
            if is_entry {
                isolated.push(point.id.clone());
            }
            terminal_ids.push(point.id.clone());
            Classification::Terminal
        } else if is_entry {
            entry_ids.push(point.id.clone());
            Classification::Entry
        } else {
            intermediate_ids.push(point.id.clone());
            Classification::Intermediate
        };

        let mut point = point.clone();
        point.target_resolved = Some(resolution_summary(index, &point.target_raw, resolution));
        classified.push(ClassifiedPoint {
            point,
            classification,
        });
    }

    info!(
        entry = entry_ids.len(),
        intermediate = intermediate_ids.len(),
        terminal = terminal_ids.len(),
        isolated = isolated.len(),
        "classified {} integration points",
        classified.len()
    );

    ClassificationResult {
        classified,
        entry_ids,
        intermediate_ids,
        terminal_ids,
        isolated,
    }
}

// ---------------------------------------------------------------------------
// Stage 2 artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyMetadata {
    pub total_points: usize,
    pub entry_points: usize,
    pub intermediate_points: usize,
    pub terminal_points: usize,
    pub isolated_points: usize,
}

/// Persisted output of Stage 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage2Artifact {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub metadata: ClassifyMetadata,
    #[serde(default)]
    pub entry_ids: Vec<String>,
    #[serde(default)]
    pub intermediate_ids: Vec<String>,
    #[serde(default)]
    pub terminal_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isolated_ids: Vec<String>,
    #[serde(default)]
    pub classified_points: Vec<ClassifiedPoint>,
}

impl Stage2Artifact {
    pub fn check_tag(&self) -> Result<()> {
        if self.stage != STAGE2_TAG {
            return Err(SeamflowError::StageInput(format!(
                "expected {STAGE2_TAG} artifact, found stage tag {:?}",
                self.stage
            )));
        }
        Ok(())
    }

    /// Rebuild the in-memory classification from a persisted artifact.
    pub fn into_result(self) -> ClassificationResult {
        ClassificationResult {
            classified: self.classified_points,
            entry_ids: self.entry_ids,
            intermediate_ids: self.intermediate_ids,
            terminal_ids: self.terminal_ids,
            isolated: self.isolated_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Boundary, BoundaryKind};
    use pretty_assertions::assert_eq as pa_eq;

    fn point(id: &str, unit: &str, callable_id: &str, name: &str, target: &str) -> IntegrationPoint {
        IntegrationPoint::new(id, unit, callable_id, name, target)
    }

    fn run(points: Vec<IntegrationPoint>, config: &EngineConfig) -> ClassificationResult {
        let store = PointStore::from_points(points).unwrap();
        let index = CallableIndex::build(&store);
        classify(&store, &index, config)
    }

    /// handle_request -> process_order -> database boundary.
    fn chain() -> Vec<IntegrationPoint> {
        vec![
            point("IP001", "api", "C001", "handle_request", "orders.process_order"),
            point("IP002", "orders", "C002", "process_order", "db.save"),
            point("IP003", "db", "C003", "save", "")
                .with_boundary(Boundary::of_kind(BoundaryKind::Database)),
        ]
    }

    #[test]
    fn chain_classifies_entry_intermediate_terminal() {
        let result = run(chain(), &EngineConfig::default());
        pa_eq!(result.classification_of("IP001"), Some(Classification::Entry));
        pa_eq!(
            result.classification_of("IP002"),
            Some(Classification::Intermediate)
        );
        pa_eq!(
            result.classification_of("IP003"),
            Some(Classification::Terminal)
        );
        assert!(result.isolated.is_empty());
    }

    #[test]
    fn partition_covers_every_point_once() {
        let result = run(chain(), &EngineConfig::default());
        pa_eq!(
            result.entry_count() + result.intermediate_count() + result.terminal_count(),
            result.classified.len()
        );
    }

    #[test]
    fn unresolved_target_is_terminal() {
        let result = run(
            vec![
                point("IP001", "api", "C001", "handle", "orders.process"),
                point("IP002", "orders", "C002", "process", "ghost.vanish"),
            ],
            &EngineConfig::default(),
        );
        pa_eq!(
            result.classification_of("IP002"),
            Some(Classification::Terminal)
        );
    }

    #[test]
    fn bare_ambiguous_target_is_terminal() {
        // Two distinct callables named "process"; a bare reference to the
        // name resolves to neither.
        let result = run(
            vec![
                point("IP001", "api", "C001", "handle", "process"),
                point("IP002", "orders", "C010", "process", "x.absent"),
                point("IP003", "refunds", "C020", "process", "y.absent"),
            ],
            &EngineConfig::default(),
        );
        pa_eq!(
            result.classification_of("IP001"),
            Some(Classification::Terminal)
        );
    }

    #[test]
    fn boundary_point_with_caller_and_resolvable_target_stays_terminal() {
        let mut points = chain();
        // Give the boundary point a resolvable onward target; boundary still
        // takes precedence.
        points[2].target_raw = "orders.process_order".into();
        let result = run(points, &EngineConfig::default());
        pa_eq!(
            result.classification_of("IP003"),
            Some(Classification::Terminal)
        );
    }

    #[test]
    fn boundaries_not_terminal_when_disabled() {
        let mut points = chain();
        points[2].target_raw = "api.handle_request".into();
        let config = EngineConfig {
            boundaries_are_terminal: false,
            ..Default::default()
        };
        let result = run(points, &config);
        // With the boundary rule off and a resolvable target, the point is no
        // longer terminal. Its own callable is now called, so every callable
        // in the cycle has a caller.
        pa_eq!(
            result.classification_of("IP003"),
            Some(Classification::Intermediate)
        );
    }

    #[test]
    fn uncalled_boundary_point_is_isolated_terminal() {
        let result = run(
            vec![
                point("IP001", "api", "C001", "handle", "orders.process"),
                point("IP002", "orders", "C002", "process", "db.save"),
                point("IP003", "db", "C003", "save", "")
                    .with_boundary(Boundary::of_kind(BoundaryKind::Database)),
                point("IP004", "cron", "C004", "tick", "")
                    .with_boundary(Boundary::of_kind(BoundaryKind::Clock)),
            ],
            &EngineConfig::default(),
        );
        pa_eq!(
            result.classification_of("IP004"),
            Some(Classification::Terminal)
        );
        pa_eq!(result.isolated, vec!["IP004".to_string()]);
    }

    #[test]
    fn classified_points_carry_resolution_summaries() {
        let result = run(chain(), &EngineConfig::default());
        let first = &result.classified[0];
        let resolved = first.point.target_resolved.as_ref().unwrap();
        pa_eq!(resolved.callable_ids, vec!["C002".to_string()]);
    }

    #[test]
    fn cycle_without_boundary_has_no_entries() {
        // a -> b -> a: every callable has a caller and every target resolves.
        let result = run(
            vec![
                point("IP001", "a", "C001", "ping", "b.pong"),
                point("IP002", "b", "C002", "pong", "a.ping"),
            ],
            &EngineConfig::default(),
        );
        pa_eq!(result.entry_count(), 0);
        pa_eq!(result.intermediate_count(), 2);
    }

    // -- artifact -------------------------------------------------------------

    #[test]
    fn artifact_counts_match_id_lists() {
        let result = run(chain(), &EngineConfig::default());
        let artifact = result.artifact();
        pa_eq!(artifact.stage, STAGE2_TAG);
        pa_eq!(artifact.metadata.entry_points, artifact.entry_ids.len());
        pa_eq!(
            artifact.metadata.terminal_points,
            artifact.terminal_ids.len()
        );
        assert!(artifact.check_tag().is_ok());
    }

    #[test]
    fn artifact_yaml_roundtrip() {
        let result = run(chain(), &EngineConfig::default());
        let yaml = serde_yaml::to_string(&result.artifact()).unwrap();
        let back: Stage2Artifact = serde_yaml::from_str(&yaml).unwrap();
        back.check_tag().unwrap();
        pa_eq!(back.classified_points.len(), 3);
        pa_eq!(
            back.classified_points[0].classification,
            Classification::Entry
        );
    }
}
