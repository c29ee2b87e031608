//! CLI Tooling
//!
//! Startup flags for the interactive agent. All session interaction happens
//! inside the REPL; the flags here only select workspace, configuration, and
//! logging behavior.

use crate::config::{BlinkConfig, ConfigLoader};
use crate::error::AgentError;
use clap::Parser;
use std::path::PathBuf;

/// Blink - conversational code generation over a hosted model API
#[derive(Parser)]
#[command(name = "blink")]
#[command(about = "Conversational code generation over a hosted model API")]
pub struct Cli {
    /// Workspace root directory (overrides configuration)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Load configuration honoring `--config` and `--workspace`, then fold
    /// the logging flags over the logging section.
    pub fn resolve_config(&self) -> Result<BlinkConfig, AgentError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => {
                let search_root = self
                    .workspace
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("."));
                ConfigLoader::load(&search_root)
            }
        }
        .map_err(|e| AgentError::Config(format!("Failed to load configuration: {}", e)))?;

        if let Some(workspace) = &self.workspace {
            config.workspace_root = workspace.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }

        Ok(config)
    }
}
