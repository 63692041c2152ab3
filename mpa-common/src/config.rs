//! Configuration loading for the analytics core
//!
//! Resolution priority (highest first):
//! 1. Explicit path (command-line argument)
//! 2. Environment variable `MPA_CONFIG`
//! 3. Platform config file (`<config dir>/mpa/config.toml`)
//! 4. Built-in defaults
//!
//! A missing config file is not fatal: a warning is logged and defaults are used.
//! A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MPA_CONFIG";

/// How the dispatch machinery reacts to use from the wrong thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCheck {
    /// Log a warning and carry on (production)
    #[default]
    Lenient,
    /// Fail fast with an error; also surfaces listener panics (test harnesses)
    Strict,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Analytics collector configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectorConfig {
    #[serde(default)]
    pub thread_check: ThreadCheck,

    /// Deliver deprecated listener callback shapes alongside the canonical ones
    #[serde(default = "default_legacy_callbacks")]
    pub legacy_callbacks: bool,

    /// Label of the execution context delivering events (shows up in logs)
    #[serde(default = "default_context_name")]
    pub context_name: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            thread_check: ThreadCheck::default(),
            legacy_callbacks: default_legacy_callbacks(),
            context_name: default_context_name(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_legacy_callbacks() -> bool {
    true
}

fn default_context_name() -> String {
    "analytics".to_string()
}

impl CollectorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load a TOML config file that must exist
    pub fn from_file(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&toml_str)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve and load configuration following the priority order
    ///
    /// An explicit path or `MPA_CONFIG` that points at a missing file falls back to
    /// defaults with a warning.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Pick the config file path by priority, without reading it
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config file (only if present)
    default_config_path().filter(|path| path.exists())
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mpa").join("config.toml"))
}
