use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the elimination passes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Macro names that must never be removed, and whose conditional blocks
    /// are kept in full
    pub macros_to_keep: Vec<String>,

    /// Remove the documentation comment attached to a removed declaration
    pub remove_comments: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            macros_to_keep: vec![],
            remove_comments: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .into_diagnostic()
            .wrap_err("Failed to parse config")
    }
}
