//! Configuration handling for taskbook
//!
//! Configuration is optional and stored in `~/.config/taskbook/config.toml`
//! (or the platform equivalent). `TASKBOOK_CONFIG` points at another file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;

/// Task file used when neither the command line nor the config names one
pub const DEFAULT_DATA_FILE: &str = "data.json";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "TASKBOOK_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// User configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task file to use when `--file` is not given
    pub data_file: Option<PathBuf>,

    /// Output format when `--format` is not given
    pub default_format: OutputFormat,
}

impl Config {
    /// Returns the platform config directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "taskbook", "taskbook").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the config file that [`Config::load`] reads
    pub fn config_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::config_dir().map(|dir| dir.join("config.toml")),
        }
    }

    /// Loads configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file; a missing file means defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Picks the task file: command line first, then config, then `data.json`
    pub fn resolve_data_file(&self, from_cli: Option<PathBuf>) -> PathBuf {
        from_cli
            .or_else(|| self.data_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }
}
