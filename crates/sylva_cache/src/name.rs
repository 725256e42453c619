//! Cache file naming.
//!
//! Regular files cache at
//! `<cache-dir>/<library>/<hashed-parent>/<basename>.<ext>`. With `-nohash`
//! the parent path is used verbatim (made relative); in parse-only mode the
//! library component is dropped as well. Precompiled packages cache at
//! `<precompiled-dir>/<basename>.<ext>` with no library component.

use std::path::{Component, Path, PathBuf};

use sylva_source::fs_utils;

use crate::policy::CachePolicy;
use crate::precompiled::PrecompiledRegistry;

/// Strips root and prefix components so a path can be re-rooted under the
/// cache directory.
fn relative_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Derives the cache file path for `source` with extension `ext`
/// (`slpp` or `slpa`).
pub fn cache_file_path(
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    source: &Path,
    ext: &str,
) -> PathBuf {
    let base = fs_utils::basename(source);
    if prec.is_precompiled(&base) {
        return policy.precompiled_dir.join(format!("{base}.{ext}"));
    }

    let parent = fs_utils::parent_dir(source);
    let subdir = if policy.no_hash || policy.parse_only {
        relative_components(&parent)
    } else {
        PathBuf::from(fs_utils::hash_path(&parent))
    };
    let library = if policy.parse_only { "" } else { policy.library.as_str() };
    policy
        .cache_dir
        .join(library)
        .join(subdir)
        .join(format!("{base}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PARSE_EXT, PP_EXT};

    fn policy() -> CachePolicy {
        CachePolicy::new(
            PathBuf::from("/out/slpp_all/cache"),
            PathBuf::from("/opt/sylva/pkg"),
            "work",
        )
    }

    #[test]
    fn hashed_layout_by_default() {
        let p = policy();
        let prec = PrecompiledRegistry::new();
        let path = cache_file_path(&p, &prec, Path::new("/proj/rtl/top.sv"), PP_EXT);
        let hash = fs_utils::hash_path(Path::new("/proj/rtl"));
        assert_eq!(
            path,
            PathBuf::from(format!("/out/slpp_all/cache/work/{hash}/top.sv.slpp"))
        );
    }

    #[test]
    fn same_dir_files_share_hash_component() {
        let p = policy();
        let prec = PrecompiledRegistry::new();
        let a = cache_file_path(&p, &prec, Path::new("/proj/rtl/a.sv"), PP_EXT);
        let b = cache_file_path(&p, &prec, Path::new("/proj/rtl/b.sv"), PP_EXT);
        assert_eq!(a.parent(), b.parent());
    }

    #[test]
    fn no_hash_uses_parent_verbatim() {
        let mut p = policy();
        p.no_hash = true;
        let prec = PrecompiledRegistry::new();
        let path = cache_file_path(&p, &prec, Path::new("/proj/rtl/top.sv"), PP_EXT);
        assert_eq!(
            path,
            PathBuf::from("/out/slpp_all/cache/work/proj/rtl/top.sv.slpp")
        );
    }

    #[test]
    fn parse_only_drops_library() {
        let mut p = policy();
        p.parse_only = true;
        let prec = PrecompiledRegistry::new();
        let path = cache_file_path(&p, &prec, Path::new("/proj/rtl/top.sv"), PARSE_EXT);
        assert_eq!(
            path,
            PathBuf::from("/out/slpp_all/cache/proj/rtl/top.sv.slpa")
        );
    }

    #[test]
    fn precompiled_goes_to_package_root() {
        let p = policy();
        let mut prec = PrecompiledRegistry::new();
        prec.register("uvm_pkg.sv");
        let path = cache_file_path(&p, &prec, Path::new("/anywhere/uvm_pkg.sv"), PP_EXT);
        assert_eq!(path, PathBuf::from("/opt/sylva/pkg/uvm_pkg.sv.slpp"));
    }

    #[test]
    fn pp_and_parse_share_directory() {
        let p = policy();
        let prec = PrecompiledRegistry::new();
        let pp = cache_file_path(&p, &prec, Path::new("/proj/top.sv"), PP_EXT);
        let pa = cache_file_path(&p, &prec, Path::new("/proj/top.sv"), PARSE_EXT);
        assert_eq!(pp.parent(), pa.parent());
        assert_ne!(pp, pa);
    }
}
