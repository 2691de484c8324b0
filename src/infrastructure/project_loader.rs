use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

pub const PYTHON_EXTENSION: &str = "py";
const PACKAGE_INIT: &str = "__init__.py";

/// A Python file discovered under a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub module: String,
    pub path: PathBuf,
}

pub struct ProjectLoader;

impl ProjectLoader {
    /// Recursively collect every `.py` file under `root`, sorted by path.
    /// Directories named in the config's `skip_dirs` are not entered.
    pub fn discover(root: &Path, config: &AnalysisConfig) -> Result<Vec<SourceFile>> {
        if !root.is_dir() {
            return Err(AnalysisError::MissingRoot(root.to_path_buf()));
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !config.skips_dir(&entry.file_name().to_string_lossy())
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !is_python_file(path) {
                continue;
            }
            if let Some(module) = Self::module_path(root, path) {
                files.push(SourceFile {
                    module,
                    path: path.to_path_buf(),
                });
            }
        }

        tracing::debug!(root = %root.display(), files = files.len(), "discovered python files");
        Ok(files)
    }

    /// Dotted module path of `file` relative to `root`.
    ///
    /// `pkg/sub/mod.py` -> `pkg.sub.mod`; `pkg/__init__.py` -> `pkg`.
    /// `None` if `file` is not under `root`.
    pub fn module_path(root: &Path, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(root).ok()?;
        let is_package_init = relative
            .file_name()
            .is_some_and(|name| name == PACKAGE_INIT);
        let module_file = if is_package_init {
            relative.parent()?.to_path_buf()
        } else {
            relative.with_extension("")
        };
        let parts: Vec<String> = module_file
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("."))
    }
}

pub fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PYTHON_EXTENSION)
}
