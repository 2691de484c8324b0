//! Source Unit
//!
//! One source file's text and its raw lines, kept for line slicing.

use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    /// Dotted module path of this file within the project.
    pub module: String,
    pub text: String,
    lines: Vec<String>,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, module: impl Into<String>, text: String) -> Self {
        let lines = text.lines().map(str::to_string).collect();
        Self {
            path: path.into(),
            module: module.into(),
            text,
            lines,
        }
    }

    pub fn read(path: &Path, module: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Ok(Self::new(path, module, text))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 1-based line lookup.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// Lines `after + 1 ..= through` (1-based), joined with newlines.
    /// Bounds are clamped to the file.
    pub fn lines_between(&self, after: usize, through: usize) -> String {
        let start = after.min(self.lines.len());
        let end = through.min(self.lines.len());
        if start >= end {
            return String::new();
        }
        self.lines[start..end].join("\n")
    }

    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> SourceUnit {
        SourceUnit::new("m.py", "m", "def a():\n    x = 1\n    b()\n".to_string())
    }

    #[test]
    fn test_line_lookup_is_one_based() {
        let unit = unit();
        assert_eq!(unit.line(1), Some("def a():"));
        assert_eq!(unit.line(3), Some("    b()"));
        assert_eq!(unit.line(0), None);
        assert_eq!(unit.line(4), None);
    }

    #[test]
    fn test_lines_between() {
        let unit = unit();
        assert_eq!(unit.lines_between(1, 3), "    x = 1\n    b()");
        assert_eq!(unit.lines_between(1, 2), "    x = 1");
        assert_eq!(unit.lines_between(2, 2), "");
        assert_eq!(unit.lines_between(2, 99), "    b()");
        assert_eq!(unit.lines_between(7, 99), "");
    }

    #[test]
    fn test_crlf_lines() {
        let unit = SourceUnit::new("w.py", "w", "a()\r\nb()\r\n".to_string());
        assert_eq!(unit.line(1), Some("a()"));
        assert_eq!(unit.line_count(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let err = SourceUnit::read(Path::new("/nonexistent/x.py"), "x").unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
