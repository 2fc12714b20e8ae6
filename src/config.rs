//! Front-end settings. The codec itself takes no configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::COMPRESSED_EXTENSION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("JSON error in {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

/// Settings file contents. Every field is optional in the JSON.
///
/// ```json
/// { "history_log": "huffpack-history.log", "record_history": true, "compressed_extension": "huf" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where completed operations are logged.
    pub history_log: PathBuf,

    /// Set to `false` to skip the history log entirely.
    pub record_history: bool,

    /// Extension for compressed files when no output path is given.
    pub compressed_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_log: PathBuf::from("huffpack-history.log"),
            record_history: true,
            compressed_extension: COMPRESSED_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
