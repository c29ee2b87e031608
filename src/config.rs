//! Configuration loading for Blink.
//!
//! Precedence (lowest to highest): built-in defaults, `blink.toml` in the
//! workspace root, `BLINK__*` environment variables with `__` separating
//! nested keys (e.g. `BLINK__PROVIDER__VERSION`).

use crate::logging::LoggingConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlinkConfig {
    /// Base directory all relative file operations resolve against.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Prediction API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the prediction API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model version hash submitted with every prediction.
    #[serde(default = "default_version")]
    pub version: String,

    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Ceiling in seconds before a non-terminal prediction is abandoned.
    #[serde(default = "default_poll_ceiling")]
    pub poll_ceiling_secs: u64,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_base_url() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_version() -> String {
    // Claude 4.5 Sonnet
    "459655107e29a683cb6deb73a9640cf9aeae39ea7c87803a2ae81c311f6ef44f".to_string()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_poll_ceiling() -> u64 {
    300
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            poll_interval_secs: default_poll_interval(),
            poll_ceiling_secs: default_poll_ceiling(),
        }
    }
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the workspace file and environment.
    pub fn load(workspace_root: &Path) -> Result<BlinkConfig, ConfigError> {
        let mut builder = Config::builder();
        let workspace_file = workspace_root.join("blink.toml");
        if workspace_file.exists() {
            builder = builder.add_source(File::from(workspace_file));
        }
        let builder = builder.add_source(
            Environment::with_prefix("BLINK")
                .separator("__")
                .try_parsing(true),
        );
        builder.build()?.try_deserialize()
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<BlinkConfig, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .add_source(
                Environment::with_prefix("BLINK")
                    .separator("__")
                    .try_parsing(true),
            );
        builder.build()?.try_deserialize()
    }
}
