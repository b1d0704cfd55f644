//! Seamflow: an integration flow graph engine.
//!
//! Takes a collection of observed integration points (call seams and
//! external-boundary crossings), classifies each as an entry, intermediate,
//! or terminal node, links them into a call graph through heuristic target
//! resolution, enumerates bounded acyclic flows from every entry point, and
//! slices those flows into sliding test-scope windows.
//!
//! The five stages run in strict order, each persisting a YAML artifact the
//! next stage (or a later re-run) consumes:
//!
//! 1. [`store`] loads and validates the point collection.
//! 2. [`classify`] assigns entry / intermediate / terminal roles.
//! 3. [`graph`] resolves targets and materializes edges.
//! 4. [`flow`] walks the graph with bounded depth-first enumeration.
//! 5. [`window`] slices flows into sliding windows.

pub mod classify;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flow;
pub mod graph;
pub mod observability;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod window;

pub use config::EngineConfig;
pub use error::{Result, SeamflowError};
