// Call graph structures for callscope.
// Maps each function's qualified name to the internal calls it makes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `<module-path>.<function-name>`, or `<module-path>.__main__` for script scope.
pub type QualifiedName = String;

/// Name of the synthetic scope holding module-level statements.
pub const MAIN_SCOPE: &str = "__main__";

pub fn qualify(module: &str, name: &str) -> QualifiedName {
    format!("{}.{}", module, name)
}

/// Last dotted component of a qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Identifies one call expression within a single graph build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call#{}", self.0)
    }
}

/// Issues increasing call ids. One generator spans a whole project build.
#[derive(Debug, Default)]
pub struct CallIdGenerator {
    next: u64,
}

impl CallIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> CallId {
        let id = CallId(self.next);
        self.next += 1;
        id
    }

    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// One internal call expression found inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub callee: QualifiedName,
    pub call_id: CallId,
    /// 1-based line of the call expression.
    pub line: usize,
    /// The call's source line, trimmed.
    pub source: String,
}

/// Line span of one function definition (or a module's `__main__` scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub qualified_name: QualifiedName,
    pub def_line: usize,
    pub end_line: usize,
}

impl FunctionNode {
    pub fn contains_line(&self, line: usize) -> bool {
        self.def_line <= line && line <= self.end_line
    }
}

/// Qualified name -> outgoing calls in source order.
///
/// A function with no internal calls may be absent or map to an empty list;
/// `calls` treats both the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallGraph {
    edges: BTreeMap<QualifiedName, Vec<CallRecord>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, keeping any calls already recorded for it.
    pub fn add_function(&mut self, name: &str) {
        self.edges.entry(name.to_string()).or_default();
    }

    pub fn add_call(&mut self, caller: &str, record: CallRecord) {
        self.edges.entry(caller.to_string()).or_default().push(record);
    }

    /// Append a batch of calls for `caller`, registering it even if the batch is empty.
    pub fn extend_calls(&mut self, caller: &str, records: Vec<CallRecord>) {
        self.edges.entry(caller.to_string()).or_default().extend(records);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn calls(&self, name: &str) -> &[CallRecord] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The stored key equal to `name`, borrowed from the graph.
    pub fn key(&self, name: &str) -> Option<&QualifiedName> {
        self.edges.get_key_value(name).map(|(k, _)| k)
    }

    pub fn functions(&self) -> impl Iterator<Item = &QualifiedName> {
        self.edges.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedName, &[CallRecord])> {
        self.edges.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(callee: &str, id: u64, line: usize) -> CallRecord {
        CallRecord {
            callee: callee.to_string(),
            call_id: CallId(id),
            line,
            source: format!("{}()", simple_name(callee)),
        }
    }

    #[test]
    fn test_absent_and_empty_are_equivalent() {
        let mut graph = CallGraph::new();
        graph.add_function("m.empty");
        assert!(graph.calls("m.empty").is_empty());
        assert!(graph.calls("m.missing").is_empty());
        assert!(graph.contains("m.empty"));
        assert!(!graph.contains("m.missing"));
    }

    #[test]
    fn test_calls_keep_insertion_order() {
        let mut graph = CallGraph::new();
        graph.add_call("m.a", record("m.c", 0, 2));
        graph.add_call("m.a", record("m.b", 1, 3));
        let callees: Vec<&str> = graph.calls("m.a").iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, vec!["m.c", "m.b"]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_add_function_keeps_existing_calls() {
        let mut graph = CallGraph::new();
        graph.add_call("m.a", record("m.b", 0, 2));
        graph.add_function("m.a");
        assert_eq!(graph.calls("m.a").len(), 1);
    }

    #[test]
    fn test_names() {
        assert_eq!(qualify("pkg.mod", "run"), "pkg.mod.run");
        assert_eq!(simple_name("pkg.mod.run"), "run");
        assert_eq!(simple_name("run"), "run");
    }

    #[test]
    fn test_id_generator_is_monotonic() {
        let mut ids = CallIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(a < b);
        assert_eq!(ids.issued(), 2);
    }
}
