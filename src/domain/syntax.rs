//! Helpers over tree-sitter Python syntax trees.
//!
//! Line numbers returned here are 1-based.

use tree_sitter::Node;

use crate::domain::callgraph::MAIN_SCOPE;

pub const FUNCTION_DEFINITION: &str = "function_definition";
pub const IF_STATEMENT: &str = "if_statement";
pub const CALL: &str = "call";

pub fn node_text<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

pub fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// Last line a node occupies on its own. A node ending at column 0 stops
/// on the previous row.
fn own_last_line(node: Node) -> usize {
    let start = node.start_position();
    let end = node.end_position();
    if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    }
}

/// Maximum line reached anywhere in the subtree of `node`.
pub fn last_line(node: Node) -> usize {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .map(last_line)
        .fold(own_last_line(node), usize::max)
}

pub fn function_name<'s>(node: Node, source: &'s [u8]) -> Option<&'s str> {
    node.child_by_field_name("name")
        .map(|name| node_text(name, source))
}

/// First function definition named `name`, in file order.
pub fn find_function<'t>(node: Node<'t>, source: &[u8], name: &str) -> Option<Node<'t>> {
    if node.kind() == FUNCTION_DEFINITION && function_name(node, source) == Some(name) {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| find_function(child, source, name))
}

/// Every function definition under `node`, in file order.
pub fn functions_in_order<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    collect_functions(node, &mut out);
    out
}

fn collect_functions<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == FUNCTION_DEFINITION {
        out.push(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    for child in children {
        collect_functions(child, out);
    }
}

/// Every call expression under `node`, outermost first.
pub fn calls_in_order<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == CALL {
            out.push(current);
        }
        let mut cursor = current.walk();
        let children: Vec<Node<'t>> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

fn unwrap_parens(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Value of a plain string literal; `None` for f-strings, bytes, or non-strings.
fn string_literal_value<'s>(node: Node, source: &'s [u8]) -> Option<&'s str> {
    if node.kind() != "string" {
        return None;
    }
    let text = node_text(node, source);
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let prefix = &text[..text.len() - body.len()];
    if prefix.chars().any(|c| matches!(c, 'f' | 'F' | 'b' | 'B')) {
        return None;
    }
    ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
        body.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

/// `__name__ == "__main__"`, possibly parenthesised.
pub fn is_main_guard(condition: Node, source: &[u8]) -> bool {
    let condition = unwrap_parens(condition);
    if condition.kind() != "comparison_operator" {
        return false;
    }
    let mut cursor = condition.walk();
    let mut parts = condition.children(&mut cursor);
    let Some(left) = parts.next() else {
        return false;
    };
    if left.kind() != "identifier" || node_text(left, source) != "__name__" {
        return false;
    }

    let mut operator: Option<&str> = None;
    for part in parts {
        if part.is_named() {
            if operator == Some("==") && string_literal_value(part, source) == Some(MAIN_SCOPE) {
                return true;
            }
            operator = None;
        } else {
            operator = Some(part.kind());
        }
    }
    false
}

/// Line of the first error or missing node, if the tree has any.
pub fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(start_line(node));
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(first_error_line)
        .or(Some(start_line(node)))
}
