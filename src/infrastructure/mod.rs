// Infrastructure implementations for callscope.

pub mod parser;
pub mod progress;
pub mod project_loader;

use std::path::Path;

use crate::config::AnalysisConfig;
use crate::domain::callgraph::{simple_name, CallIdGenerator};
use crate::domain::resolve::{HeuristicResolver, NameResolver};
use crate::domain::segment::extract_segments;
use crate::domain::source::SourceUnit;
use crate::domain::walker::{SyntaxWalker, WalkOptions};
use crate::error::Result;
use crate::ports::{CallGraphBuilder, ProjectGraph, ScanObserver, SkippedFile};

use self::parser::PythonParser;
use self::project_loader::{ProjectLoader, SourceFile};

/// Call Graph Assembler: parses every Python file under a root with
/// tree-sitter and merges the per-file results.
pub struct TreeSitterCallGraphBuilder {
    config: AnalysisConfig,
    resolver: Box<dyn NameResolver>,
}

impl TreeSitterCallGraphBuilder {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            resolver: Box::new(HeuristicResolver),
        }
    }

    /// Swap the call classification strategy.
    pub fn with_resolver(mut self, resolver: Box<dyn NameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    fn analyse_file(
        &self,
        file: &SourceFile,
        parser: &mut PythonParser,
        ids: &mut CallIdGenerator,
        out: &mut ProjectGraph,
    ) -> Result<()> {
        let unit = SourceUnit::read(&file.path, &file.module)?;
        let tree = parser.parse_unit(&unit)?;
        let options = WalkOptions {
            descend_into_call_arguments: self.config.descend_into_call_arguments,
        };
        let analysis = SyntaxWalker::new(&unit, self.resolver.as_ref(), ids)
            .with_options(options)
            .walk(&tree);
        let main_scope = analysis.main_scope();

        if let Some(previous) = out.modules.insert(file.module.clone(), file.path.clone()) {
            tracing::warn!(
                module = %file.module,
                previous = %previous.display(),
                file = %file.path.display(),
                "two files map to the same module; merging their calls"
            );
        }

        for (name, calls) in analysis.calls {
            if name != main_scope {
                let segments =
                    extract_segments(&unit, tree.root_node(), simple_name(&name), &calls);
                out.segments.insert(name.clone(), segments);
            }
            out.graph.extend_calls(&name, calls);
        }
        out.functions.extend(analysis.functions);
        Ok(())
    }
}

impl Default for TreeSitterCallGraphBuilder {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl CallGraphBuilder for TreeSitterCallGraphBuilder {
    fn build_call_graph(&self, root: &Path, observer: &dyn ScanObserver) -> Result<ProjectGraph> {
        let files = ProjectLoader::discover(root, &self.config)?;
        let mut parser = PythonParser::new()?;
        let mut ids = CallIdGenerator::new();
        let mut out = ProjectGraph::default();

        observer.scan_started(files.len());
        for (index, file) in files.iter().enumerate() {
            observer.file_started(index, files.len(), &file.path);
            tracing::debug!(file = %file.path.display(), module = %file.module, "analysing");

            if let Err(e) = self.analyse_file(file, &mut parser, &mut ids, &mut out) {
                if !e.is_per_file() {
                    return Err(e);
                }
                tracing::warn!(file = %file.path.display(), error = %e, "skipping file");
                out.skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
            }
        }

        tracing::info!(
            root = %root.display(),
            files = files.len(),
            skipped = out.skipped.len(),
            functions = out.graph.len(),
            calls = out.graph.edge_count(),
            "call graph built"
        );
        observer.scan_finished(&out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NoopObserver;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builds_across_modules() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(
            root.join("main.py"),
            "from pkg import util\n\ndef run():\n    util.helper()\n    local()\n\ndef local():\n    pass\n\nif __name__ == '__main__':\n    run()\n",
        )
        .unwrap();
        fs::write(root.join("pkg/__init__.py"), "").unwrap();
        fs::write(root.join("pkg/util.py"), "def helper():\n    return 1\n").unwrap();

        let project = TreeSitterCallGraphBuilder::default()
            .build_call_graph(root, &NoopObserver)
            .unwrap();

        let callees: Vec<&str> = project
            .graph
            .calls("main.run")
            .iter()
            .map(|c| c.callee.as_str())
            .collect();
        assert_eq!(callees, vec!["util.helper", "main.local"]);
        assert_eq!(project.graph.calls("main.__main__")[0].callee, "main.run");
        assert!(project.graph.contains("pkg.util.helper"));
        assert!(project.graph.contains("pkg.__main__"));
        assert!(project.segments.contains_key("main.run"));
        assert!(!project.segments.contains_key("main.__main__"));
        assert_eq!(project.modules["pkg"], root.join("pkg/__init__.py"));
        assert!(project.skipped.is_empty());
    }

    #[test]
    fn test_call_ids_unique_across_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    g()\n").unwrap();
        fs::write(dir.path().join("b.py"), "def f():\n    g()\n").unwrap();
        let project = TreeSitterCallGraphBuilder::default()
            .build_call_graph(dir.path(), &NoopObserver)
            .unwrap();
        assert_ne!(
            project.graph.calls("a.f")[0].call_id,
            project.graph.calls("b.f")[0].call_id
        );
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.py"), "def ok():\n    pass\n").unwrap();
        fs::write(dir.path().join("bad.py"), "def broken(:\n    pass\n").unwrap();
        let project = TreeSitterCallGraphBuilder::default()
            .build_call_graph(dir.path(), &NoopObserver)
            .unwrap();
        assert!(project.graph.contains("good.ok"));
        assert!(!project.graph.contains("bad.broken"));
        assert_eq!(project.skipped.len(), 1);
        assert!(project.skipped[0].path.ends_with("bad.py"));
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.py"), "def ok():\n    pass\n").unwrap();
        fs::write(dir.path().join("latin.py"), b"def caf\xe9():\n    pass\n").unwrap();
        let project = TreeSitterCallGraphBuilder::default()
            .build_call_graph(dir.path(), &NoopObserver)
            .unwrap();
        assert!(project.graph.contains("good.ok"));
        assert_eq!(project.skipped.len(), 1);
        assert!(project.skipped[0].path.ends_with("latin.py"));
        assert!(project.skipped[0].reason.contains("IO error"));
        assert!(!project.modules.contains_key("latin"));
    }

    struct Recorder(RefCell<Vec<String>>);
    impl ScanObserver for Recorder {
        fn scan_started(&self, total_files: usize) {
            self.0.borrow_mut().push(format!("start {}", total_files));
        }
        fn file_started(&self, index: usize, _total: usize, path: &Path) {
            let name = path.file_name().unwrap().to_string_lossy();
            self.0.borrow_mut().push(format!("{} {}", index, name));
        }
        fn scan_finished(&self, _graph: &ProjectGraph) {
            self.0.borrow_mut().push("done".to_string());
        }
    }

    #[test]
    fn test_observer_sees_every_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "pass\n").unwrap();
        fs::write(dir.path().join("b.py"), "pass\n").unwrap();
        let recorder = Recorder(RefCell::new(Vec::new()));
        TreeSitterCallGraphBuilder::default()
            .build_call_graph(dir.path(), &recorder)
            .unwrap();
        assert_eq!(
            recorder.0.into_inner(),
            vec!["start 2", "0 a.py", "1 b.py", "done"]
        );
    }
}
