//! Analysis configuration.
//!
//! Defaults are usable as-is; a TOML file can override any field and CLI
//! flags override the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub const DEFAULT_MAX_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Depth bound for call trees when a request does not give one.
    pub max_depth: usize,
    /// Directory names never descended into during enumeration.
    pub skip_dirs: Vec<String>,
    /// Record calls nested inside another call expression, e.g. `g` in `f(g())`.
    pub descend_into_call_arguments: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            skip_dirs: vec![".git".to_string(), "__pycache__".to_string()],
            descend_into_call_arguments: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AnalysisError::Config {
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn skips_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }
}
