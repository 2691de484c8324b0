//! Call Tree
//!
//! Expands the call graph into a rooted, depth-bounded tree for one entry point.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::callgraph::{simple_name, CallGraph, CallId, CallRecord, QualifiedName};
use crate::domain::segment::{Segment, SegmentTable};

/// A node in the call tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTreeNode {
    /// Function name without its module path
    pub name: String,
    pub qualified_name: QualifiedName,
    /// Call expression that produced this node; absent on the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
    /// Source line of that call expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_line: Option<String>,
    /// Body segments, when the function was expanded and has any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    pub children: Vec<CallTreeNode>,
}

impl CallTreeNode {
    fn root(qualified_name: &str) -> Self {
        Self {
            name: simple_name(qualified_name).to_string(),
            qualified_name: qualified_name.to_string(),
            call_id: None,
            call_line: None,
            segments: None,
            children: Vec::new(),
        }
    }

    fn for_call(call: &CallRecord) -> Self {
        Self {
            call_id: Some(call.call_id),
            call_line: Some(call.source.clone()),
            ..Self::root(&call.callee)
        }
    }

    /// Total nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CallTreeNode::size).sum::<usize>()
    }

    /// Longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(CallTreeNode::depth).max().unwrap_or(0)
    }
}

/// What a recursive expansion contributes to the node it is merged into.
struct Expansion {
    segments: Option<Vec<Segment>>,
    children: Vec<CallTreeNode>,
}

pub struct CallTreeBuilder<'g> {
    graph: &'g CallGraph,
    segments: &'g SegmentTable,
    max_depth: usize,
}

impl<'g> CallTreeBuilder<'g> {
    pub fn new(graph: &'g CallGraph, segments: &'g SegmentTable, max_depth: usize) -> Self {
        Self {
            graph,
            segments,
            max_depth,
        }
    }

    /// Build the tree rooted at `entry`, or `None` when `entry` is not a graph key.
    pub fn build(&self, entry: &str) -> Option<CallTreeNode> {
        let entry = self.graph.key(entry)?;
        let expansion = self.expand(entry, 1, HashSet::new())?;
        let mut root = CallTreeNode::root(entry);
        root.segments = expansion.segments;
        root.children = expansion.children;
        Some(root)
    }

    /// `visited` holds the ancestors on the current path only; each child gets its own copy.
    fn expand(
        &self,
        current: &'g str,
        depth: usize,
        mut visited: HashSet<&'g str>,
    ) -> Option<Expansion> {
        if depth > self.max_depth || visited.contains(current) {
            return None;
        }

        let segments = self.segments.get(current).cloned();
        let mut children = Vec::new();

        if depth < self.max_depth {
            visited.insert(current);
            for call in self.graph.calls(current) {
                let mut child = CallTreeNode::for_call(call);
                if let Some(expansion) = self.expand(&call.callee, depth + 1, visited.clone()) {
                    child.segments = expansion.segments;
                    child.children = expansion.children;
                }
                children.push(child);
            }
        }

        Some(Expansion { segments, children })
    }
}
