//! Helpers for driving the full Sylva pipeline against on-disk projects.
//!
//! Each test builds a temporary project, runs one or more invocations
//! through [`sylva_cli::execute_compilation`], and inspects the produced
//! cache files, log and statistics.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use sylva_diagnostics::Stats;
use sylva_source::fs_utils;
use tempfile::TempDir;

/// A temporary project directory with source files and an output root.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Creates an empty project.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp project dir"),
        }
    }

    /// The project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a source file under the project root, returning its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Runs one invocation with the project root as the output directory.
    pub fn run(&self, extra: &[&str]) -> (u32, Stats) {
        let mut args = vec![
            "-o".to_string(),
            self.dir.path().to_string_lossy().into_owned(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        sylva_cli::execute_compilation(&args)
    }

    /// The whole-project cache root (`<root>/slpp_all/cache`).
    pub fn cache_root(&self) -> PathBuf {
        self.dir.path().join("slpp_all").join("cache")
    }

    /// The derived cache path of `source` for the given extension
    /// (`slpp`/`slpa`), assuming the default hashed layout.
    pub fn cache_path(&self, source: &Path, ext: &str) -> PathBuf {
        let hash = fs_utils::hash_path(&fs_utils::parent_dir(source));
        self.cache_root()
            .join("work")
            .join(hash)
            .join(format!("{}.{ext}", fs_utils::basename(source)))
    }

    /// Collects `(path, mtime)` for every file under the cache root.
    pub fn cache_snapshot(&self) -> Vec<(PathBuf, std::time::SystemTime)> {
        let mut files = Vec::new();
        collect_files(&self.cache_root(), &mut files);
        files.sort();
        files
            .into_iter()
            .map(|p| {
                let mtime = std::fs::metadata(&p).unwrap().modified().unwrap();
                (p, mtime)
            })
            .collect()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}
