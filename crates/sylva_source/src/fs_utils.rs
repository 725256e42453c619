//! Path and directory helpers shared by every stage of the frontend.

use std::path::{Component, Path, PathBuf};

use sylva_common::ContentHash;

/// Returns the file-name component of `path`, or an empty string if there
/// is none (e.g. the path ends in `..`).
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Returns the parent directory of `path`, or an empty path if there is none.
pub fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Normalizes a path to the host's preferred separator form.
///
/// Forward slashes become backslashes on Windows; on Unix the path is
/// rebuilt component-wise, which also collapses redundant `.` components.
pub fn preferred_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Returns `true` if `path` exists on disk.
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Returns `true` if `path` exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Creates `path` and all missing parents. Returns `false` on failure.
pub fn mkdirs(path: &Path) -> bool {
    std::fs::create_dir_all(path).is_ok()
}

/// Removes `path` and everything beneath it. Missing paths count as success.
pub fn rm_recursive(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }
    std::fs::remove_dir_all(path).is_ok()
}

/// Deterministic fingerprint of a full path, used as a compact directory
/// component in the cache layout.
///
/// The same algorithm must be used when saving and loading a cache file so
/// both sides derive the same location.
pub fn hash_path(path: &Path) -> String {
    ContentHash::of_path(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_plain_file() {
        assert_eq!(basename(Path::new("/proj/rtl/top.sv")), "top.sv");
        assert_eq!(basename(Path::new("top.sv")), "top.sv");
    }

    #[test]
    fn basename_of_dotdot_is_empty() {
        assert_eq!(basename(Path::new("/proj/..")), "");
    }

    #[test]
    fn parent_of_nested_path() {
        assert_eq!(
            parent_dir(Path::new("/proj/rtl/top.sv")),
            PathBuf::from("/proj/rtl")
        );
    }

    #[test]
    fn parent_of_bare_file_is_empty() {
        assert_eq!(parent_dir(Path::new("top.sv")), PathBuf::from(""));
    }

    #[test]
    fn preferred_path_collapses_curdir() {
        assert_eq!(
            preferred_path(Path::new("./rtl/./top.sv")),
            PathBuf::from("rtl/top.sv")
        );
    }

    #[test]
    fn preferred_path_of_dot_is_dot() {
        assert_eq!(preferred_path(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn mkdirs_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        assert!(!exists(&nested));
        assert!(mkdirs(&nested));
        assert!(exists(&nested));
        assert!(is_directory(&nested));
    }

    #[test]
    fn rm_recursive_removes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cache").join("work");
        mkdirs(&nested);
        std::fs::write(nested.join("f.slpp"), b"data").unwrap();
        assert!(rm_recursive(&dir.path().join("cache")));
        assert!(!exists(&dir.path().join("cache")));
    }

    #[test]
    fn rm_recursive_missing_is_ok() {
        assert!(rm_recursive(Path::new("/nonexistent/sylva/cache")));
    }

    #[test]
    fn hash_path_is_deterministic() {
        let a = hash_path(Path::new("/proj/rtl"));
        let b = hash_path(Path::new("/proj/rtl"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn hash_path_differs_per_path() {
        assert_ne!(hash_path(Path::new("/proj/rtl")), hash_path(Path::new("/proj/tb")));
    }
}
