//! Heuristic target resolution shared by the Classifier and the Graph
//! Builder.
//!
//! A target string from the ledger is matched against known source callables
//! by four ranked strategies, most specific first. The first strategy that
//! produces any match wins; later strategies are never consulted for that
//! target. Candidate lists are always sorted by callable id so resolution is
//! deterministic regardless of store layout.

use std::collections::HashMap;

use crate::store::PointStore;
use crate::types::{ResolutionMethod, ResolutionStatus, TargetResolution};

// ---------------------------------------------------------------------------
// CallableIndex
// ---------------------------------------------------------------------------

/// One known source callable, aggregated from every point it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableInfo {
    pub callable_id: String,
    pub unit: String,
    pub name: String,
    /// Indices into the store's point slice, input order.
    pub point_indices: Vec<usize>,
}

impl CallableInfo {
    /// `unit::callable_id` form used in diagnostics.
    pub fn qualified(&self) -> String {
        format!("{}::{}", self.unit, self.callable_id)
    }
}

/// Lookup structure over every callable that contains at least one point.
#[derive(Debug, Clone)]
pub struct CallableIndex {
    /// Sorted by callable id.
    callables: Vec<CallableInfo>,
    by_id: HashMap<String, usize>,
    /// Name -> indices into `callables`, each list sorted.
    by_name: HashMap<String, Vec<usize>>,
}

impl CallableIndex {
    pub fn build(store: &PointStore) -> Self {
        let mut by_callable: HashMap<&str, CallableInfo> = HashMap::new();
        for (point_index, point) in store.points().iter().enumerate() {
            let entry = by_callable
                .entry(point.source_callable_id.as_str())
                .or_insert_with(|| CallableInfo {
                    callable_id: point.source_callable_id.clone(),
                    unit: point.source_unit.clone(),
                    name: point.source_callable_name.clone(),
                    point_indices: Vec::new(),
                });
            entry.point_indices.push(point_index);
        }

        let mut callables: Vec<CallableInfo> = by_callable.into_values().collect();
        callables.sort_by(|a, b| a.callable_id.cmp(&b.callable_id));

        let mut by_id = HashMap::with_capacity(callables.len());
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, callable) in callables.iter().enumerate() {
            by_id.insert(callable.callable_id.clone(), i);
            if !callable.name.is_empty() {
                by_name.entry(callable.name.clone()).or_default().push(i);
            }
        }

        Self {
            callables,
            by_id,
            by_name,
        }
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }

    /// All callables, sorted by callable id.
    pub fn callables(&self) -> &[CallableInfo] {
        &self.callables
    }

    pub fn get(&self, callable_id: &str) -> Option<&CallableInfo> {
        self.by_id.get(callable_id).map(|&i| &self.callables[i])
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Strategy 1: target equals a callable id.
pub fn match_exact_id(index: &CallableIndex, target: &str) -> Vec<String> {
    match index.get(target) {
        Some(c) => vec![c.callable_id.clone()],
        None => Vec::new(),
    }
}

/// Strategy 2: target equals a callable name.
pub fn match_exact_name(index: &CallableIndex, target: &str) -> Vec<String> {
    match index.by_name.get(target) {
        Some(ids) => ids
            .iter()
            .map(|&i| index.callables[i].callable_id.clone())
            .collect(),
        None => Vec::new(),
    }
}

/// Strategy 3: target ends with `"." + name`.
pub fn match_qualified_suffix(index: &CallableIndex, target: &str) -> Vec<String> {
    index
        .callables
        .iter()
        .filter(|c| {
            !c.name.is_empty()
                && target.len() > c.name.len()
                && target.ends_with(&c.name)
                && target.as_bytes()[target.len() - c.name.len() - 1] == b'.'
        })
        .map(|c| c.callable_id.clone())
        .collect()
}

/// Strategy 4: some `.`-delimited segment of the target equals a callable
/// name. Only applies to qualified targets.
pub fn match_qualified_segment(index: &CallableIndex, target: &str) -> Vec<String> {
    if !target.contains('.') {
        return Vec::new();
    }
    index
        .callables
        .iter()
        .filter(|c| !c.name.is_empty() && target.split('.').any(|seg| seg == c.name))
        .map(|c| c.callable_id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Outcome of resolving one target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No strategy produced any match.
    Unresolved,
    /// A bare identifier matched several distinct callables. No edges are
    /// created; the matches list names the candidates.
    AmbiguousBare {
        method: ResolutionMethod,
        matches: Vec<String>,
    },
    /// One or more callables matched a (qualified or unique) target. Edges
    /// fan out to every candidate; `ambiguous` flags the multi-match case.
    Matched {
        method: ResolutionMethod,
        callable_ids: Vec<String>,
        ambiguous: bool,
    },
}

impl Resolution {
    /// Whether the target counts as resolved for classification purposes.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Callable ids edges should point at (empty unless matched).
    pub fn callable_ids(&self) -> &[String] {
        match self {
            Self::Matched { callable_ids, .. } => callable_ids,
            _ => &[],
        }
    }
}

/// Resolve one target string through the ranked strategies.
pub fn resolve_target(index: &CallableIndex, target: &str) -> Resolution {
    let target = target.trim();
    if target.is_empty() {
        return Resolution::Unresolved;
    }

    let ranked: [(ResolutionMethod, fn(&CallableIndex, &str) -> Vec<String>); 4] = [
        (ResolutionMethod::ExactCallableId, match_exact_id),
        (ResolutionMethod::ExactCallableName, match_exact_name),
        (ResolutionMethod::QualifiedSuffix, match_qualified_suffix),
        (ResolutionMethod::QualifiedSegment, match_qualified_segment),
    ];

    for (method, strategy) in ranked {
        let matches = strategy(index, target);
        if matches.is_empty() {
            continue;
        }
        if matches.len() > 1 && !target.contains('.') {
            return Resolution::AmbiguousBare { method, matches };
        }
        let ambiguous = matches.len() > 1;
        return Resolution::Matched {
            method,
            callable_ids: matches,
            ambiguous,
        };
    }

    Resolution::Unresolved
}

/// Per-point resolution summary for the stage artifacts.
pub fn resolution_summary(index: &CallableIndex, raw: &str, resolution: &Resolution) -> TargetResolution {
    let qualified = |ids: &[String]| -> Vec<String> {
        ids.iter()
            .filter_map(|id| index.get(id).map(CallableInfo::qualified))
            .collect()
    };

    match resolution {
        Resolution::Unresolved => TargetResolution::unresolved(raw),
        Resolution::AmbiguousBare { method, matches } => TargetResolution {
            status: ResolutionStatus::Ambiguous,
            raw: raw.to_string(),
            method: Some(*method),
            callable_ids: Vec::new(),
            matches: qualified(matches),
            note: Some("bare identifier matched multiple callables; no edges created".into()),
        },
        Resolution::Matched {
            method,
            callable_ids,
            ambiguous,
        } => TargetResolution {
            status: ResolutionStatus::Resolved,
            raw: raw.to_string(),
            method: Some(*method),
            callable_ids: callable_ids.clone(),
            matches: qualified(callable_ids),
            note: ambiguous
                .then(|| "qualified target matched multiple callables; edges fan out".into()),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntegrationPoint;
    use pretty_assertions::assert_eq as pa_eq;
    use test_case::test_case;

    fn index(points: Vec<IntegrationPoint>) -> CallableIndex {
        CallableIndex::build(&PointStore::from_points(points).unwrap())
    }

    fn sample_index() -> CallableIndex {
        index(vec![
            IntegrationPoint::new("IP001", "billing", "C001", "charge", "ledger.post"),
            IntegrationPoint::new("IP002", "billing", "C001", "charge", "audit.append"),
            IntegrationPoint::new("IP003", "ledger", "C002", "post", "audit.append"),
            IntegrationPoint::new("IP004", "audit", "C003", "append", "fmt.render"),
        ])
    }

    // -- index ----------------------------------------------------------------

    #[test]
    fn index_aggregates_points_per_callable() {
        let idx = sample_index();
        pa_eq!(idx.len(), 3);
        let charge = idx.get("C001").unwrap();
        pa_eq!(charge.point_indices, vec![0, 1]);
        pa_eq!(charge.qualified(), "billing::C001");
    }

    #[test]
    fn index_callables_sorted_by_id() {
        let idx = index(vec![
            IntegrationPoint::new("IP001", "z", "C9", "zed", "x.y"),
            IntegrationPoint::new("IP002", "a", "C1", "alef", "x.y"),
        ]);
        let ids: Vec<&str> = idx.callables().iter().map(|c| c.callable_id.as_str()).collect();
        pa_eq!(ids, vec!["C1", "C9"]);
    }

    // -- strategies -----------------------------------------------------------

    #[test]
    fn exact_id_beats_everything() {
        let idx = sample_index();
        pa_eq!(match_exact_id(&idx, "C002"), vec!["C002".to_string()]);
        match resolve_target(&idx, "C002") {
            Resolution::Matched { method, callable_ids, .. } => {
                pa_eq!(method, ResolutionMethod::ExactCallableId);
                pa_eq!(callable_ids, vec!["C002".to_string()]);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn exact_name_match() {
        let idx = sample_index();
        pa_eq!(match_exact_name(&idx, "append"), vec!["C003".to_string()]);
        pa_eq!(match_exact_name(&idx, "nothing"), Vec::<String>::new());
    }

    #[test_case("ledger.post", &["C002"] ; "unit qualified")]
    #[test_case("deep.module.post", &["C002"] ; "deeply qualified")]
    #[test_case("repost", &[] ; "substring is not a suffix")]
    #[test_case("post", &[] ; "bare name is not a dotted suffix")]
    fn qualified_suffix_match(target: &str, expected: &[&str]) {
        let idx = sample_index();
        pa_eq!(
            match_qualified_suffix(&idx, target),
            expected.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn qualified_segment_matches_inner_segment() {
        let idx = sample_index();
        pa_eq!(
            match_qualified_segment(&idx, "post.retry"),
            vec!["C002".to_string()]
        );
        // Bare targets never reach this strategy.
        pa_eq!(match_qualified_segment(&idx, "post"), Vec::<String>::new());
    }

    #[test]
    fn suffix_ranks_above_segment() {
        // "ledger.post" also segment-matches "post"; the suffix strategy must
        // be the one recorded.
        let idx = sample_index();
        match resolve_target(&idx, "ledger.post") {
            Resolution::Matched { method, .. } => {
                pa_eq!(method, ResolutionMethod::QualifiedSuffix);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    // -- ambiguity ------------------------------------------------------------

    #[test]
    fn bare_multi_match_is_ambiguous_with_no_candidates() {
        let idx = index(vec![
            IntegrationPoint::new("IP001", "orders", "C010", "process", "x.y"),
            IntegrationPoint::new("IP002", "refunds", "C020", "process", "x.y"),
            IntegrationPoint::new("IP003", "api", "C030", "handle", "process"),
        ]);
        match resolve_target(&idx, "process") {
            Resolution::AmbiguousBare { method, matches } => {
                pa_eq!(method, ResolutionMethod::ExactCallableName);
                pa_eq!(matches, vec!["C010".to_string(), "C020".to_string()]);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn qualified_multi_match_fans_out() {
        let idx = index(vec![
            IntegrationPoint::new("IP001", "orders", "C010", "process", "x.y"),
            IntegrationPoint::new("IP002", "refunds", "C020", "process", "x.y"),
        ]);
        match resolve_target(&idx, "jobs.process") {
            Resolution::Matched {
                callable_ids,
                ambiguous,
                ..
            } => {
                pa_eq!(callable_ids, vec!["C010".to_string(), "C020".to_string()]);
                assert!(ambiguous);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test_case("" ; "empty target")]
    #[test_case("   " ; "whitespace target")]
    #[test_case("ghost_fn" ; "unknown bare name")]
    #[test_case("ghost.module.fn" ; "unknown qualified name")]
    fn unresolvable_targets(target: &str) {
        let idx = sample_index();
        pa_eq!(resolve_target(&idx, target), Resolution::Unresolved);
    }

    // -- summaries ------------------------------------------------------------

    #[test]
    fn summary_for_bare_ambiguity_lists_qualified_candidates() {
        let idx = index(vec![
            IntegrationPoint::new("IP001", "orders", "C010", "process", "x.y"),
            IntegrationPoint::new("IP002", "refunds", "C020", "process", "x.y"),
        ]);
        let resolution = resolve_target(&idx, "process");
        let summary = resolution_summary(&idx, "process", &resolution);
        pa_eq!(summary.status, ResolutionStatus::Ambiguous);
        pa_eq!(
            summary.matches,
            vec!["orders::C010".to_string(), "refunds::C020".to_string()]
        );
        assert!(summary.callable_ids.is_empty());
    }

    #[test]
    fn summary_for_resolved_target() {
        let idx = sample_index();
        let resolution = resolve_target(&idx, "ledger.post");
        let summary = resolution_summary(&idx, "ledger.post", &resolution);
        pa_eq!(summary.status, ResolutionStatus::Resolved);
        pa_eq!(summary.callable_ids, vec!["C002".to_string()]);
        pa_eq!(summary.method, Some(ResolutionMethod::QualifiedSuffix));
        assert!(summary.note.is_none());
    }
}
