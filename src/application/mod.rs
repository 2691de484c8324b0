// Public operations of callscope, wired over the ports.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::domain::callgraph::{qualify, MAIN_SCOPE};
use crate::domain::calltree::{CallTreeBuilder, CallTreeNode};
use crate::domain::entry_point::{EntryPoint, EntryPointDetector};
use crate::domain::snippet::callee_names;
use crate::domain::source::SourceUnit;
use crate::error::{AnalysisError, Result};
use crate::infrastructure::parser::PythonParser;
use crate::infrastructure::project_loader::ProjectLoader;
use crate::ports::{
    CallGraphBuilder, NoopObserver, ProgressStore, ProjectGraph, ScanObserver,
};

/// Which call tree to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRequest {
    pub project_root: PathBuf,
    /// Relative paths are resolved against `project_root`.
    pub entry_file: PathBuf,
    /// Simple function name; `__main__` selects the script-level scope.
    pub function: String,
    pub max_depth: usize,
}

impl TreeRequest {
    pub fn new(project_root: impl Into<PathBuf>, entry_file: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            entry_file: entry_file.into(),
            function: MAIN_SCOPE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

pub struct AnalyzeUsecase<'a> {
    pub callgraph_builder: &'a dyn CallGraphBuilder,
    /// Where job progress is reported, if anywhere.
    pub progress: Option<&'a dyn ProgressStore>,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn new(callgraph_builder: &'a dyn CallGraphBuilder) -> Self {
        Self {
            callgraph_builder,
            progress: None,
        }
    }

    pub fn with_progress(mut self, store: &'a dyn ProgressStore) -> Self {
        self.progress = Some(store);
        self
    }

    /// Scan `root` into a call graph, segment table and module map.
    /// With a job id and a progress store, per-file progress is recorded under that job.
    pub fn build_call_graph(&self, root: &Path, job: Option<&str>) -> Result<ProjectGraph> {
        match (self.progress, job) {
            (Some(store), Some(job)) => {
                let observer = ProgressObserver { store, job };
                let result = self.callgraph_builder.build_call_graph(root, &observer);
                match &result {
                    Ok(_) => store.complete(job),
                    Err(e) => store.fail(job, &e.to_string()),
                }
                result
            }
            _ => self.callgraph_builder.build_call_graph(root, &NoopObserver),
        }
    }

    /// Build the depth-bounded call tree for `request`.
    pub fn build_call_tree(&self, request: &TreeRequest, job: Option<&str>) -> Result<CallTreeNode> {
        if request.max_depth < 1 {
            return Err(AnalysisError::InvalidDepth(request.max_depth));
        }
        let root = canonical_root(&request.project_root)?;
        let entry = entry_point_name(&root, &request.entry_file, &request.function)?;
        let project = self.build_call_graph(&root, job)?;

        CallTreeBuilder::new(&project.graph, &project.segments, request.max_depth)
            .build(&entry)
            .ok_or_else(|| {
                tracing::warn!(entry = %entry, "entry point not found in call graph");
                let err = AnalysisError::EntryNotFound {
                    entry,
                    available: project.graph.functions().cloned().collect(),
                };
                if let (Some(store), Some(job)) = (self.progress, job) {
                    store.fail(job, &err.to_string());
                }
                err
            })
    }
}

/// Qualified entry name for `function` in `entry_file`.
pub fn entry_point_name(root: &Path, entry_file: &Path, function: &str) -> Result<String> {
    let candidate = if entry_file.is_absolute() {
        entry_file.to_path_buf()
    } else {
        root.join(entry_file)
    };
    if !candidate.is_file() {
        return Err(AnalysisError::MissingSource(candidate));
    }
    let file = candidate
        .canonicalize()
        .map_err(|e| AnalysisError::io(&candidate, e))?;
    let module = ProjectLoader::module_path(root, &file).ok_or_else(|| {
        AnalysisError::OutsideProject {
            file: file.clone(),
            root: root.to_path_buf(),
        }
    })?;
    Ok(qualify(&module, function))
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(AnalysisError::MissingRoot(root.to_path_buf()));
    }
    root.canonicalize().map_err(|e| AnalysisError::io(root, e))
}

/// Distinct called names in a standalone snippet, without qualification.
pub fn extract_callee_names(source: &str) -> Result<BTreeSet<String>> {
    let mut parser = PythonParser::new()?;
    let tree = parser.parse_checked(source, Path::new("<snippet>"))?;
    Ok(callee_names(tree.root_node(), source.as_bytes()))
}

/// Functions and script entry of one file, each with its source text.
/// The module path comes from `root` when given, else from the file stem.
pub fn list_functions(root: Option<&Path>, file: &Path) -> Result<Vec<EntryPoint>> {
    if !file.is_file() {
        return Err(AnalysisError::MissingSource(file.to_path_buf()));
    }
    let module = root
        .and_then(|root| ProjectLoader::module_path(root, file))
        .or_else(|| {
            file.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let unit = SourceUnit::read(file, &module)?;
    let tree = PythonParser::new()?.parse_unit(&unit)?;
    Ok(EntryPointDetector::detect(&unit, tree.root_node()))
}

/// Stable job id derived from a project root.
pub fn job_id_for(root: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    root.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

struct ProgressObserver<'a> {
    store: &'a dyn ProgressStore,
    job: &'a str,
}

impl ScanObserver for ProgressObserver<'_> {
    fn scan_started(&self, total_files: usize) {
        self.store.begin(self.job, total_files);
    }

    fn file_started(&self, index: usize, _total_files: usize, path: &Path) {
        self.store
            .advance(self.job, index, &path.display().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::progress::MemoryProgressStore;
    use crate::infrastructure::TreeSitterCallGraphBuilder;
    use crate::ports::JobStatus;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_callee_names_snippet() {
        let names = extract_callee_names("def f():\n    x.run()\n    helper()\n").unwrap();
        let expected: BTreeSet<String> = ["run", "helper"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_extract_callee_names_rejects_bad_snippet() {
        assert!(matches!(
            extract_callee_names("def f(:\n"),
            Err(AnalysisError::Parse { .. })
        ));
    }

    #[test]
    fn test_job_id_is_stable() {
        assert_eq!(job_id_for(Path::new("/a/b")), job_id_for(Path::new("/a/b")));
        assert_ne!(job_id_for(Path::new("/a/b")), job_id_for(Path::new("/a/c")));
        assert_eq!(job_id_for(Path::new("/a/b")).len(), 16);
    }

    #[test]
    fn test_progress_is_recorded() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    g()\n").unwrap();
        let builder = TreeSitterCallGraphBuilder::default();
        let store = MemoryProgressStore::new();
        let usecase = AnalyzeUsecase::new(&builder).with_progress(&store);

        usecase.build_call_graph(dir.path(), Some("job")).unwrap();
        let progress = store.get("job").unwrap();
        assert_eq!(progress.status, JobStatus::Complete);
        assert_eq!(progress.total_files, 1);
        assert_eq!(progress.current_index, 1);
    }

    #[test]
    fn test_progress_records_failure() {
        let builder = TreeSitterCallGraphBuilder::default();
        let store = MemoryProgressStore::new();
        let usecase = AnalyzeUsecase::new(&builder).with_progress(&store);
        assert!(usecase
            .build_call_graph(Path::new("/nonexistent/root"), Some("job"))
            .is_err());
        assert_eq!(store.get("job").unwrap().status, JobStatus::Failed);
    }

    #[test]
    fn test_missing_entry_fails_the_job() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    g()\n").unwrap();
        let builder = TreeSitterCallGraphBuilder::default();
        let store = MemoryProgressStore::new();
        let usecase = AnalyzeUsecase::new(&builder).with_progress(&store);

        let request = TreeRequest::new(dir.path(), "a.py").function("nope");
        assert!(matches!(
            usecase.build_call_tree(&request, Some("job")),
            Err(AnalysisError::EntryNotFound { .. })
        ));
        let progress = store.get("job").unwrap();
        assert_eq!(progress.status, JobStatus::Failed);
        assert!(progress.error.unwrap().contains("a.nope"));
    }

    #[test]
    fn test_entry_point_name() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/__init__.py"), "").unwrap();
        fs::write(root.join("pkg/cli.py"), "").unwrap();

        assert_eq!(
            entry_point_name(&root, Path::new("pkg/cli.py"), "main").unwrap(),
            "pkg.cli.main"
        );
        assert_eq!(
            entry_point_name(&root, &root.join("pkg/__init__.py"), MAIN_SCOPE).unwrap(),
            "pkg.__main__"
        );
        assert!(matches!(
            entry_point_name(&root, Path::new("nope.py"), "main"),
            Err(AnalysisError::MissingSource(_))
        ));
    }

    #[test]
    fn test_list_functions() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("tool.py");
        fs::write(&file, "def a():\n    pass\n\nif __name__ == '__main__':\n    a()\n").unwrap();
        let entries = list_functions(None, &file).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["tool.a", "tool.__main__"]);
    }
}
