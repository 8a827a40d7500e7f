//! Configuration file loading.
//!
//! Settings come from `scoresheet.toml` in the working directory. Every
//! field has a default, and a missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Scoresheet settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScoresheetConfig {
    /// Where the session snapshot is written. Defaults to `data/session.json`.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
    /// Log filter used when `RUST_LOG` is unset. Defaults to `info`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Movetext line width in generated PGN. Defaults to 80.
    #[serde(default = "default_pgn_line_width")]
    pub pgn_line_width: usize,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("data/session.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pgn_line_width() -> usize {
    scoresheet_rules::pgn::DEFAULT_LINE_WIDTH
}

impl Default for ScoresheetConfig {
    fn default() -> Self {
        ScoresheetConfig {
            session_path: default_session_path(),
            log_level: default_log_level(),
            pgn_line_width: default_pgn_line_width(),
        }
    }
}

impl ScoresheetConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Loads the configuration from `path`, or defaults if it does not exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from("scoresheet.toml")
    }
}
