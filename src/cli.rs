//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{self, EngineConfig};
use crate::error::Result;
use crate::pipeline::RunOptions;

#[derive(Debug, Parser)]
#[command(
    name = "seamflow",
    version,
    about = "Integration flow graph engine: classify seams, enumerate flows, slice test windows"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the five-stage pipeline (or a single stage) over a point collection.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Integration point collection (YAML or JSON). Required for a full run
    /// and for stage 1.
    #[arg(long)]
    pub points: Option<PathBuf>,

    /// Directory for stage artifacts.
    #[arg(long, default_value = "seamflow-out")]
    pub output_dir: PathBuf,

    /// Engine config file (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run only one stage (1-5), reading its predecessor's artifact from the
    /// output directory.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub stage: Option<u8>,

    /// Override: maximum points per flow.
    #[arg(long)]
    pub max_flow_depth: Option<usize>,

    /// Override: maximum flows per entry point.
    #[arg(long)]
    pub max_flows_per_entry: Option<usize>,

    /// Override: maximum paths explored per entry point.
    #[arg(long)]
    pub max_paths_per_entry: Option<usize>,

    /// Override: minimum window length.
    #[arg(long)]
    pub min_window_length: Option<usize>,

    /// Override: maximum window length (0 = full flow length).
    #[arg(long)]
    pub max_window_length: Option<usize>,

    /// Treat boundary points as non-terminal.
    #[arg(long)]
    pub boundaries_not_terminal: bool,

    /// Disable the enumeration progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Resolve the effective config: file (or defaults), then flag overrides,
    /// then validation.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config(path)?,
            None => EngineConfig::default(),
        };

        if let Some(v) = self.max_flow_depth {
            cfg.max_flow_depth = v;
        }
        if let Some(v) = self.max_flows_per_entry {
            cfg.max_flows_per_entry = v;
        }
        if let Some(v) = self.max_paths_per_entry {
            cfg.max_paths_explored_per_entry = v;
        }
        if let Some(v) = self.min_window_length {
            cfg.min_window_length = v;
        }
        if let Some(v) = self.max_window_length {
            cfg.max_window_length = if v == 0 { None } else { Some(v) };
        }
        if self.boundaries_not_terminal {
            cfg.boundaries_are_terminal = false;
        }
        if self.no_progress {
            cfg.show_progress = false;
        }

        config::validated(cfg)
    }

    pub fn to_options(&self) -> Result<RunOptions> {
        Ok(RunOptions {
            points: self.points.clone(),
            output_dir: self.output_dir.clone(),
            config: self.engine_config()?,
            stage: self.stage,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
