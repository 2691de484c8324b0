//! Entry Point Detection Module
//!
//! Lists the candidate entry points of one Python file: every function
//! definition with its source, plus the `if __name__ == "__main__":` block.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::domain::callgraph::{qualify, QualifiedName, MAIN_SCOPE};
use crate::domain::source::SourceUnit;
use crate::domain::syntax::{
    function_name, functions_in_order, is_main_guard, last_line, node_text, start_line,
    IF_STATEMENT,
};

/// Represents a detected entry point in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Qualified name, usable as a call-tree entry
    pub id: QualifiedName,
    /// Simple name (`__main__` for the script block)
    pub name: String,
    pub kind: EntryPointKind,
    pub line: usize,
    pub end_line: usize,
    /// Source text of the definition or guarded block
    pub code: String,
}

/// Classification of entry point types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPointKind {
    /// if __name__ == "__main__"
    ScriptMain,
    /// def at module level or nested in another def
    Function,
    /// def inside a class body
    Method,
}

pub struct EntryPointDetector;

impl EntryPointDetector {
    /// Entry points of `unit`, in file order.
    pub fn detect(unit: &SourceUnit, root: Node) -> Vec<EntryPoint> {
        let source = unit.bytes();
        let mut entries: Vec<EntryPoint> = functions_in_order(root)
            .into_iter()
            .filter_map(|func| {
                let name = function_name(func, source)?;
                Some(EntryPoint {
                    id: qualify(&unit.module, name),
                    name: name.to_string(),
                    kind: if Self::is_method(func) {
                        EntryPointKind::Method
                    } else {
                        EntryPointKind::Function
                    },
                    line: start_line(func),
                    end_line: last_line(func),
                    code: node_text(func, source).to_string(),
                })
            })
            .collect();

        if let Some(guard) = Self::find_main_guard(root, source) {
            entries.push(EntryPoint {
                id: qualify(&unit.module, MAIN_SCOPE),
                name: MAIN_SCOPE.to_string(),
                kind: EntryPointKind::ScriptMain,
                line: start_line(guard),
                end_line: last_line(guard),
                code: node_text(guard, source).to_string(),
            });
        }

        entries.sort_by_key(|e| e.line);
        entries
    }

    fn is_method(func: Node) -> bool {
        let mut current = func.parent();
        while let Some(node) = current {
            match node.kind() {
                "class_definition" => return true,
                "function_definition" => return false,
                _ => current = node.parent(),
            }
        }
        false
    }

    fn find_main_guard<'t>(node: Node<'t>, source: &[u8]) -> Option<Node<'t>> {
        if node.kind() == IF_STATEMENT
            && node
                .child_by_field_name("condition")
                .is_some_and(|c| is_main_guard(c, source))
        {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        children
            .into_iter()
            .find_map(|child| Self::find_main_guard(child, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parser::PythonParser;

    fn detect(module: &str, src: &str) -> Vec<EntryPoint> {
        let unit = SourceUnit::new(format!("{}.py", module), module, src.to_string());
        let tree = PythonParser::new().unwrap().parse_unit(&unit).unwrap();
        EntryPointDetector::detect(&unit, tree.root_node())
    }

    #[test]
    fn test_detect_python_main() {
        let source = r#"
def foo():
    pass

if __name__ == "__main__":
    foo()
"#;
        let entries = detect("app", source);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "app.foo");
        assert_eq!(entries[0].kind, EntryPointKind::Function);
        assert_eq!(entries[0].code, "def foo():\n    pass");
        assert_eq!(entries[1].id, "app.__main__");
        assert_eq!(entries[1].kind, EntryPointKind::ScriptMain);
        assert_eq!((entries[1].line, entries[1].end_line), (5, 6));
    }

    #[test]
    fn test_detect_methods_and_nested() {
        let source = r#"
class Routes:
    @staticmethod
    def get_users():
        def fmt(u):
            return u
        return []
"#;
        let entries = detect("routes", source);
        let kinds: Vec<(&str, EntryPointKind)> =
            entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("get_users", EntryPointKind::Method),
                ("fmt", EntryPointKind::Function)
            ]
        );
    }

    #[test]
    fn test_no_entries() {
        assert!(detect("empty", "x = 1\n").is_empty());
    }
}
