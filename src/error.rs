//! Error types for callscope.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Source text that tree-sitter could not parse cleanly.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Project root not found: {0}")]
    MissingRoot(PathBuf),

    #[error("Entry file not found: {0}")]
    MissingSource(PathBuf),

    #[error("Entry file {file} is outside project root {root}")]
    OutsideProject { file: PathBuf, root: PathBuf },

    /// Requested entry point is not a key of the call graph.
    /// `available` holds the graph keys, sorted, for diagnosis.
    #[error("Entry point {entry} not found in call graph ({} available)", available.len())]
    EntryNotFound {
        entry: String,
        available: Vec<String>,
    },

    #[error("Max depth must be at least 1, got {0}")]
    InvalidDepth(usize),

    #[error("Parser setup failed: {0}")]
    Parser(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures scoped to a single file, which a project scan skips.
    pub fn is_per_file(&self) -> bool {
        matches!(self, AnalysisError::Parse { .. } | AnalysisError::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_not_found_reports_count() {
        let err = AnalysisError::EntryNotFound {
            entry: "pkg.main".to_string(),
            available: vec!["pkg.a".to_string(), "pkg.b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("pkg.main"));
        assert!(msg.contains("2 available"));
    }

    #[test]
    fn per_file_classification() {
        let parse = AnalysisError::Parse {
            path: PathBuf::from("a.py"),
            message: "syntax error at line 3".to_string(),
        };
        assert!(parse.is_per_file());
        assert!(!AnalysisError::InvalidDepth(0).is_per_file());
    }
}
