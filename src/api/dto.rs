use serde::{Deserialize, Serialize};

use crate::domain::callgraph::{simple_name, CallId};
use crate::ports::{ProjectGraph, SkippedFile};

/// Flat node/edge view of a call graph, as sent to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    pub label: String,
    pub module: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
    pub call_id: CallId,
    pub line: usize,
    /// False when `to` is not a scope of the graph.
    pub internal: bool,
}

impl From<&ProjectGraph> for GraphDto {
    fn from(project: &ProjectGraph) -> Self {
        let graph = &project.graph;
        let nodes = graph
            .functions()
            .map(|id| {
                let label = simple_name(id);
                let module = id
                    .strip_suffix(label)
                    .map(|m| m.trim_end_matches('.'))
                    .unwrap_or_default();
                NodeDto {
                    id: id.clone(),
                    label: label.to_string(),
                    module: module.to_string(),
                }
            })
            .collect();

        let edges = graph
            .iter()
            .flat_map(|(caller, calls)| {
                calls.iter().map(move |call| EdgeDto {
                    from: caller.clone(),
                    to: call.callee.clone(),
                    call_id: call.call_id,
                    line: call.line,
                    internal: graph.contains(&call.callee),
                })
            })
            .collect();

        GraphDto {
            nodes,
            edges,
            skipped: project.skipped.clone(),
        }
    }
}
