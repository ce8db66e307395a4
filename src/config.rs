use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::core::db::ConnectionConfig;
use crate::core::{MiniblogError, Result};

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: ConnectionConfig,
    pub demo: Option<DemoConfig>,
}

/// Options for the demonstration walkthrough.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoConfig {
    /// Create this many filler posts before the walkthrough proper.
    pub seed_posts: Option<u32>,
    /// Dump the full query log as JSON after the walkthrough.
    pub dump_log_json: Option<bool>,
}

impl Config {
    /// Demo options with absent settings resolved to their defaults.
    pub fn demo_options(&self) -> DemoConfig {
        self.demo.clone().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: ConnectionConfig::in_memory(),
            demo: None,
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Errors
///
/// Returns `MiniblogError::Io` when the file cannot be read and
/// `MiniblogError::Config` when it does not parse as valid configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref())?;
    toml::from_str(&content).map_err(|e| {
        MiniblogError::Config(format!(
            "Failed to parse '{}': {}",
            path.as_ref().display(),
            e
        ))
    })
}
