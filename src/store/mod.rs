//! Stage 1: the integration point store.
//!
//! Loads the upstream ledger collection, structurally validates every record,
//! and exposes indexed access for the later stages. The store is append-only
//! for the lifetime of a run: no stage mutates it after loading.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SeamflowError};
use crate::types::IntegrationPoint;

/// Stage tag written into (and expected from) the Stage 1 artifact.
pub const STAGE1_TAG: &str = "stage1-integration-points";

// ---------------------------------------------------------------------------
// PointStore
// ---------------------------------------------------------------------------

/// Validated, indexed collection of integration points.
#[derive(Debug, Clone)]
pub struct PointStore {
    points: Vec<IntegrationPoint>,
    by_id: HashMap<String, usize>,
}

impl PointStore {
    /// Validate and index a point collection.
    ///
    /// The whole run aborts on the first structurally invalid record: a
    /// partial store would silently distort classification and the graph.
    pub fn from_points(points: Vec<IntegrationPoint>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(points.len());

        for (index, point) in points.iter().enumerate() {
            if point.id.trim().is_empty() {
                return Err(SeamflowError::MalformedInput {
                    index,
                    id: String::new(),
                    reason: "missing id".into(),
                });
            }
            if point.source_callable_id.trim().is_empty() {
                return Err(SeamflowError::MalformedInput {
                    index,
                    id: point.id.clone(),
                    reason: "missing source_callable_id".into(),
                });
            }
            if point.target_raw.trim().is_empty() && !point.is_boundary() {
                return Err(SeamflowError::MalformedInput {
                    index,
                    id: point.id.clone(),
                    reason: "empty target on non-boundary point".into(),
                });
            }
            if by_id.insert(point.id.clone(), index).is_some() {
                return Err(SeamflowError::MalformedInput {
                    index,
                    id: point.id.clone(),
                    reason: format!("duplicate id {}", point.id),
                });
            }
        }

        Ok(Self { points, by_id })
    }

    /// Load a point collection from a YAML or JSON file.
    ///
    /// Accepts either a bare list of points or a document with an
    /// `integration_points` key (which covers re-reading a Stage 1 artifact).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let points = if is_json {
            parse_points_json(&text)?
        } else {
            parse_points_yaml(&text)?
        };

        let store = Self::from_points(points)?;
        info!(
            points = store.len(),
            units = store.unit_count(),
            callables = store.callable_count(),
            "loaded integration point store from {}",
            path.display()
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in input order. Input order is the deterministic iteration
    /// order for every downstream stage.
    pub fn points(&self) -> &[IntegrationPoint] {
        &self.points
    }

    pub fn get(&self, id: &str) -> Option<&IntegrationPoint> {
        self.by_id.get(id).map(|&i| &self.points[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Distinct source units, sorted.
    pub fn units(&self) -> BTreeSet<&str> {
        self.points.iter().map(|p| p.source_unit.as_str()).collect()
    }

    pub fn unit_count(&self) -> usize {
        self.units().len()
    }

    /// Distinct source callable ids, sorted.
    pub fn callable_ids(&self) -> BTreeSet<&str> {
        self.points
            .iter()
            .map(|p| p.source_callable_id.as_str())
            .collect()
    }

    pub fn callable_count(&self) -> usize {
        self.callable_ids().len()
    }

    pub fn boundary_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_boundary()).count()
    }

    /// Seam-kind histogram, sorted by kind name.
    pub fn kind_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for point in &self.points {
            *counts.entry(point.kind.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Build the persisted Stage 1 artifact.
    pub fn artifact(&self) -> Stage1Artifact {
        Stage1Artifact {
            stage: STAGE1_TAG.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            metadata: StoreMetadata {
                total_points: self.len(),
                total_units: self.unit_count(),
                total_callables: self.callable_count(),
                boundary_points: self.boundary_count(),
                kind_counts: self.kind_counts(),
            },
            integration_points: self.points.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage 1 artifact
// ---------------------------------------------------------------------------

/// Count summary persisted alongside the point collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub total_points: usize,
    pub total_units: usize,
    pub total_callables: usize,
    pub boundary_points: usize,
    #[serde(default)]
    pub kind_counts: BTreeMap<String, usize>,
}

/// Persisted output of Stage 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage1Artifact {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub metadata: StoreMetadata,
    #[serde(default)]
    pub integration_points: Vec<IntegrationPoint>,
}

impl Stage1Artifact {
    /// Reject artifacts written by a different stage.
    pub fn check_tag(&self) -> Result<()> {
        if self.stage != STAGE1_TAG {
            return Err(SeamflowError::StageInput(format!(
                "expected {STAGE1_TAG} artifact, found stage tag {:?}",
                self.stage
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PointCollection {
    #[serde(default)]
    integration_points: Vec<IntegrationPoint>,
}

fn parse_points_yaml(text: &str) -> Result<Vec<IntegrationPoint>> {
    if let Ok(points) = serde_yaml::from_str::<Vec<IntegrationPoint>>(text) {
        return Ok(points);
    }
    let collection: PointCollection = serde_yaml::from_str(text)?;
    Ok(collection.integration_points)
}

fn parse_points_json(text: &str) -> Result<Vec<IntegrationPoint>> {
    if let Ok(points) = serde_json::from_str::<Vec<IntegrationPoint>>(text) {
        return Ok(points);
    }
    let collection: PointCollection = serde_json::from_str(text)?;
    Ok(collection.integration_points)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
