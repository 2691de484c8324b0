//! Syntax Tree Walker
//!
//! Walks one file's tree with a stack of enclosing scopes and attributes every
//! internal call to the innermost function, or to the module's synthetic
//! `__main__` scope for script-level code.

use std::collections::BTreeMap;

use tree_sitter::{Node, Tree};

use crate::domain::callgraph::{
    qualify, CallIdGenerator, CallRecord, FunctionNode, QualifiedName, MAIN_SCOPE,
};
use crate::domain::resolve::{CallTarget, NameResolver, Resolution};
use crate::domain::source::SourceUnit;
use crate::domain::syntax::{
    function_name, is_main_guard, last_line, start_line, CALL, FUNCTION_DEFINITION, IF_STATEMENT,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Also visit arguments and callee expressions of a recorded call.
    pub descend_into_call_arguments: bool,
}

/// Everything the walker learned about one file.
#[derive(Debug, Default)]
pub struct FileAnalysis {
    pub module: String,
    /// Calls per scope, in source order. Every observed scope is present.
    pub calls: BTreeMap<QualifiedName, Vec<CallRecord>>,
    pub functions: BTreeMap<QualifiedName, FunctionNode>,
}

impl FileAnalysis {
    pub fn main_scope(&self) -> QualifiedName {
        qualify(&self.module, MAIN_SCOPE)
    }
}

pub struct SyntaxWalker<'a> {
    unit: &'a SourceUnit,
    resolver: &'a dyn NameResolver,
    ids: &'a mut CallIdGenerator,
    options: WalkOptions,
    context: Vec<QualifiedName>,
    analysis: FileAnalysis,
}

impl<'a> SyntaxWalker<'a> {
    pub fn new(
        unit: &'a SourceUnit,
        resolver: &'a dyn NameResolver,
        ids: &'a mut CallIdGenerator,
    ) -> Self {
        Self {
            unit,
            resolver,
            ids,
            options: WalkOptions::default(),
            context: Vec::new(),
            analysis: FileAnalysis {
                module: unit.module.clone(),
                ..FileAnalysis::default()
            },
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn walk(mut self, tree: &Tree) -> FileAnalysis {
        let root = tree.root_node();
        let main = self.analysis.main_scope();
        self.enter_scope(&main, 1, last_line(root).max(1));
        self.visit_children(root);
        self.context.pop();
        self.analysis
    }

    /// Push a scope, resetting whatever an earlier definition of the same name recorded.
    fn enter_scope(&mut self, name: &str, def_line: usize, end_line: usize) {
        self.analysis.calls.insert(name.to_string(), Vec::new());
        self.analysis.functions.insert(
            name.to_string(),
            FunctionNode {
                qualified_name: name.to_string(),
                def_line,
                end_line,
            },
        );
        self.context.push(name.to_string());
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            FUNCTION_DEFINITION => self.visit_function(node),
            IF_STATEMENT => self.visit_if(node),
            CALL => self.visit_call(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_function(&mut self, node: Node) {
        let Some(name) = function_name(node, self.unit.bytes()) else {
            self.visit_children(node);
            return;
        };
        let qualified = qualify(&self.unit.module, name);
        self.enter_scope(&qualified, start_line(node), last_line(node));
        self.visit_children(node);
        self.context.pop();
    }

    fn visit_if(&mut self, node: Node) {
        let guard = node
            .child_by_field_name("condition")
            .is_some_and(|condition| is_main_guard(condition, self.unit.bytes()));
        if !guard {
            self.visit_children(node);
            return;
        }

        // Only the guarded body runs as script entry; elif/else branches are not visited.
        let main = self.analysis.main_scope();
        let pushed = self.context.last() != Some(&main);
        if pushed {
            self.context.push(main);
        }
        if let Some(body) = node.child_by_field_name("consequence") {
            self.visit_children(body);
        }
        if pushed {
            self.context.pop();
        }
    }

    fn visit_call(&mut self, node: Node) {
        if let Some(caller) = self.context.last().cloned() {
            if let Some(function) = node.child_by_field_name("function") {
                let target = CallTarget::from_node(function, self.unit.bytes());
                if let Resolution::Internal(callee) =
                    self.resolver.resolve(&target, &self.unit.module)
                {
                    let line = start_line(node);
                    let record = CallRecord {
                        callee,
                        call_id: self.ids.next_id(),
                        line,
                        source: self.unit.line(line).unwrap_or_default().trim().to_string(),
                    };
                    self.analysis.calls.entry(caller).or_default().push(record);
                }
            }
        }

        if self.options.descend_into_call_arguments {
            self.visit_children(node);
        }
    }
}
