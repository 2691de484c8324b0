use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::callgraph::{CallGraph, FunctionNode, QualifiedName};
use crate::domain::calltree::CallTreeNode;
use crate::domain::segment::SegmentTable;
use crate::error::Result;

pub mod tree_exporter;

/// A file left out of a graph build, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything one project scan produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectGraph {
    pub graph: CallGraph,
    pub segments: SegmentTable,
    /// Module path -> file it was read from.
    pub modules: BTreeMap<String, PathBuf>,
    pub functions: BTreeMap<QualifiedName, FunctionNode>,
    pub skipped: Vec<SkippedFile>,
}

/// Builds the project-wide call graph from a root directory.
pub trait CallGraphBuilder {
    fn build_call_graph(&self, root: &Path, observer: &dyn ScanObserver) -> Result<ProjectGraph>;
}

/// Receives per-file events during a scan. All methods default to no-ops.
pub trait ScanObserver {
    fn scan_started(&self, _total_files: usize) {}
    fn file_started(&self, _index: usize, _total_files: usize, _path: &Path) {}
    fn scan_finished(&self, _graph: &ProjectGraph) {}
}

pub struct NoopObserver;
impl ScanObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Complete,
    Failed,
}

/// Progress of one analysis job, as polled by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub status: JobStatus,
    /// 0..=100
    pub percent: u8,
    pub current_file: String,
    pub current_index: usize,
    pub total_files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-job progress records, owned by the request-handling layer.
pub trait ProgressStore: Send + Sync {
    fn begin(&self, job: &str, total_files: usize);
    fn advance(&self, job: &str, index: usize, current_file: &str);
    fn complete(&self, job: &str);
    fn fail(&self, job: &str, error: &str);
    fn get(&self, job: &str) -> Option<Progress>;
}

/// Renders a call tree into some output format.
pub trait OutputExporter {
    fn render(&self, tree: &CallTreeNode) -> String;

    fn export(&self, tree: &CallTreeNode, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render(tree))
    }
}
