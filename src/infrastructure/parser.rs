/// tree-sitter Python parser.

use std::path::Path;

use tree_sitter::{Parser, Tree};

use crate::domain::source::SourceUnit;
use crate::domain::syntax::first_error_line;
use crate::error::{AnalysisError, Result};

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| AnalysisError::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse without rejecting syntax errors; error nodes stay in the tree.
    pub fn parse_text(&mut self, text: &str) -> Result<Tree> {
        self.parser
            .parse(text, None)
            .ok_or_else(|| AnalysisError::Parser("parser returned no tree".to_string()))
    }

    /// Parse, failing if the tree contains any syntax error.
    pub fn parse_checked(&mut self, text: &str, path: &Path) -> Result<Tree> {
        let tree = self.parse_text(text)?;
        if let Some(line) = first_error_line(tree.root_node()) {
            return Err(AnalysisError::Parse {
                path: path.to_path_buf(),
                message: format!("syntax error at line {}", line),
            });
        }
        Ok(tree)
    }

    pub fn parse_unit(&mut self, unit: &SourceUnit) -> Result<Tree> {
        self.parse_checked(&unit.text, &unit.path)
    }
}
