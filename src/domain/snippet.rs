//! Callee names of a standalone snippet.
//!
//! Unlike the walker, this looks at every call in the snippet (nested ones
//! included), keeps only the bare called name, and does no internal/external
//! classification.

use std::collections::BTreeSet;

use tree_sitter::Node;

use crate::domain::resolve::CallTarget;
use crate::domain::syntax::calls_in_order;

pub fn callee_names(root: Node, source: &[u8]) -> BTreeSet<String> {
    calls_in_order(root)
        .into_iter()
        .filter_map(|call| call.child_by_field_name("function"))
        .filter_map(|function| {
            CallTarget::from_node(function, source)
                .callee_name()
                .map(str::to_string)
        })
        .collect()
}
