//! Configuration data structures for the flow engine.
//!
//! Defines the YAML config format: traversal bounds, window lengths, and
//! classification knobs. Designed for file loading plus CLI overrides with
//! serde defaults.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Root configuration for a pipeline run.
///
/// Every traversal bound must be finite and positive; `validate` rejects
/// anything that would let enumeration run unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of points in one flow path.
    #[serde(default = "default_max_flow_depth")]
    pub max_flow_depth: usize,

    /// Maximum flows emitted from any single entry point.
    #[serde(default = "default_max_flows_per_entry")]
    pub max_flows_per_entry: usize,

    /// Maximum paths explored (emitted plus abandoned) per entry point.
    #[serde(default = "default_max_paths_explored_per_entry")]
    pub max_paths_explored_per_entry: usize,

    /// Smallest window emitted by the Window Generator.
    #[serde(default = "default_min_window_length")]
    pub min_window_length: usize,

    /// Largest window emitted. `None` means full flow length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_window_length: Option<usize>,

    /// When true (the default), a boundary-carrying point classifies
    /// Terminal regardless of whether its target would resolve.
    #[serde(default = "default_true")]
    pub boundaries_are_terminal: bool,

    /// Show a progress bar while enumerating flows.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_flow_depth: default_max_flow_depth(),
            max_flows_per_entry: default_max_flows_per_entry(),
            max_paths_explored_per_entry: default_max_paths_explored_per_entry(),
            min_window_length: default_min_window_length(),
            max_window_length: None,
            boundaries_are_terminal: true,
            show_progress: true,
        }
    }
}

impl EngineConfig {
    /// Check all bounds, returning every violation (not just the first).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_flow_depth == 0 {
            errors.push(format!(
                "max_flow_depth must be > 0 (got {})",
                self.max_flow_depth
            ));
        }
        if self.max_flows_per_entry == 0 {
            errors.push(format!(
                "max_flows_per_entry must be > 0 (got {})",
                self.max_flows_per_entry
            ));
        }
        if self.max_paths_explored_per_entry == 0 {
            errors.push(format!(
                "max_paths_explored_per_entry must be > 0 (got {})",
                self.max_paths_explored_per_entry
            ));
        }
        if self.min_window_length < 2 {
            errors.push(format!(
                "min_window_length must be >= 2 (got {})",
                self.min_window_length
            ));
        }
        if let Some(max) = self.max_window_length {
            if max < self.min_window_length {
                errors.push(format!(
                    "max_window_length ({}) must be >= min_window_length ({})",
                    max, self.min_window_length
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Effective maximum window length for a flow of `flow_length` points.
    pub fn effective_max_window(&self, flow_length: usize) -> usize {
        match self.max_window_length {
            Some(max) => max.min(flow_length),
            None => flow_length,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_max_flow_depth() -> usize {
    20
}

fn default_max_flows_per_entry() -> usize {
    100
}

fn default_max_paths_explored_per_entry() -> usize {
    10_000
}

fn default_min_window_length() -> usize {
    2
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq as pa_eq;
    use test_case::test_case;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        pa_eq!(config.max_flow_depth, 20);
        pa_eq!(config.max_flows_per_entry, 100);
        pa_eq!(config.max_paths_explored_per_entry, 10_000);
        pa_eq!(config.min_window_length, 2);
        pa_eq!(config.max_window_length, None);
        assert!(config.boundaries_are_terminal);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        pa_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_one_field() {
        let config: EngineConfig = serde_yaml::from_str("max_flow_depth: 8").unwrap();
        pa_eq!(config.max_flow_depth, 8);
        pa_eq!(config.max_flows_per_entry, 100);
    }

    #[test]
    fn full_yaml_config() {
        let yaml = r#"
max_flow_depth: 12
max_flows_per_entry: 50
max_paths_explored_per_entry: 500
min_window_length: 3
max_window_length: 6
boundaries_are_terminal: false
show_progress: false
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        pa_eq!(config.max_flow_depth, 12);
        pa_eq!(config.max_window_length, Some(6));
        assert!(!config.boundaries_are_terminal);
        assert!(!config.show_progress);
        assert!(config.validate().is_ok());
    }

    #[test_case(0, 100, 100 ; "zero depth")]
    #[test_case(20, 0, 100 ; "zero flows per entry")]
    #[test_case(20, 100, 0 ; "zero paths explored")]
    fn zero_bound_rejected(depth: usize, flows: usize, paths: usize) {
        let config = EngineConfig {
            max_flow_depth: depth,
            max_flows_per_entry: flows,
            max_paths_explored_per_entry: paths,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_window_below_two_rejected() {
        let config = EngineConfig {
            min_window_length: 1,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors[0].contains("min_window_length"));
    }

    #[test]
    fn max_window_below_min_rejected() {
        let config = EngineConfig {
            min_window_length: 4,
            max_window_length: Some(3),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_collects_all_violations() {
        let config = EngineConfig {
            max_flow_depth: 0,
            max_flows_per_entry: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        pa_eq!(errors.len(), 2);
    }

    #[test_case(None, 5, 5 ; "unbounded uses flow length")]
    #[test_case(Some(3), 5, 3 ; "bounded below flow length")]
    #[test_case(Some(9), 5, 5 ; "bound above flow length clamps")]
    fn effective_max_window(max: Option<usize>, flow_len: usize, expected: usize) {
        let config = EngineConfig {
            max_window_length: max,
            ..Default::default()
        };
        pa_eq!(config.effective_max_window(flow_len), expected);
    }

    #[test]
    fn yaml_roundtrip() {
        let config = EngineConfig {
            max_flow_depth: 7,
            max_window_length: Some(4),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        pa_eq!(config, back);
    }
}
