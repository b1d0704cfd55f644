//! Engine configuration: schema, file loading, and validation.

pub mod schema;

pub use schema::EngineConfig;

use std::path::Path;

use crate::error::{Result, SeamflowError};

/// Load a config file and validate its bounds.
///
/// Validation failures are fatal: the engine refuses to start a run whose
/// traversal bounds could be unbounded.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SeamflowError::Config(format!("cannot read config {}: {}", path.display(), e))
    })?;
    let config: EngineConfig = serde_yaml::from_str(&text)
        .map_err(|e| SeamflowError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
    validated(config)
}

/// Run [`EngineConfig::validate`], folding violations into a fatal error.
pub fn validated(config: EngineConfig) -> Result<EngineConfig> {
    config
        .validate()
        .map_err(|errors| SeamflowError::Config(errors.join("; ")))?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
