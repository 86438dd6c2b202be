//! Tracker configuration: parser markers and statistics tunables.
//!
//! Every field has a default, so an empty JSON object is a valid config.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parser::ParserConfig;
use crate::stats::StatsConfig;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} cannot use {marker:?} (whitespace, digits and parentheses are reserved)")]
    InvalidMarker { field: &'static str, marker: char },
    #[error("{first} and {second} share the marker {marker:?}")]
    DuplicateMarker {
        first: &'static str,
        second: &'static str,
        marker: char,
    },
    #[error("stats.top_k must be at least 1")]
    ZeroTopK,
    #[error("stats.tags[{index}] is blank")]
    BlankTag { index: usize },
    #[error("stats.tags lists {0:?} more than once")]
    DuplicateTag(String),
}

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config is not valid JSON")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

impl TrackerConfig {
    /// # Errors
    ///
    /// Returns the first violated invariant of either section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()?;
        self.stats.validate()
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
