//! Declarative loader configuration.
//!
//! A [LoaderConfig] describes everything a [Loader](super::loader::Loader)
//! needs (cache root, name policy, resolution tables, watched files) and
//! deserializes from JSON or YAML, so an embedding can keep its
//! instrumentation setup next to its other project configuration.
//!
//! ```yaml
//! cache: .graft-cache
//! exclude: ["vendor\\*"]
//! prefixes:
//!   "App\\": [src]
//! watch: [composer.json]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors while loading or parsing a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Syntax { format: &'static str, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, message } => {
                write!(f, "cannot read config {}: {}", path.display(), message)
            }
            ConfigError::Syntax { format, message } => {
                write!(f, "invalid {format} config: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serializable description of a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Cache root; caching is disabled when absent.
    pub cache: Option<PathBuf>,
    /// Include globs over unit names; empty admits everything.
    pub include: Vec<String>,
    /// Exclude globs over unit names; matches load unmodified.
    pub exclude: Vec<String>,
    /// Prefix → directory-list resolution table.
    pub prefixes: BTreeMap<String, Vec<PathBuf>>,
    /// Legacy-style prefix → directory-list table.
    pub legacy_prefixes: BTreeMap<String, Vec<PathBuf>>,
    /// Exact name → path map.
    pub classmap: BTreeMap<String, PathBuf>,
    /// When set, only the classmap resolves names.
    pub authoritative: bool,
    /// Files whose mtime invalidates every cache entry.
    pub watch: Vec<PathBuf>,
}

impl LoaderConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|error| ConfigError::Syntax {
            format: "json",
            message: error.to_string(),
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|error| ConfigError::Syntax {
            format: "yaml",
            message: error.to_string(),
        })
    }

    /// Read a config file, dispatching on its extension (`.yml`/`.yaml` are
    /// YAML, everything else JSON).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }
}
