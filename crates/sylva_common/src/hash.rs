//! Path fingerprints for the cache directory layout.
//!
//! Cache files for `/proj/rtl/top.sv` land under
//! `cache/<library>/<fingerprint-of-/proj/rtl>/top.sv.slpp`, so the
//! fingerprint must be deterministic across invocations (save and load
//! derive the same location) and collision-free at repository scale.
//! XXH3-128 over the path bytes satisfies both.

use std::fmt;
use std::path::Path;

/// A 128-bit XXH3 fingerprint.
///
/// Rendered as 32 lowercase hex digits, which is the form used as a cache
/// directory component. Two paths with equal fingerprints are assumed to
/// be the same path.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Fingerprints a path, byte-for-byte as rendered.
    ///
    /// No canonicalization happens here: callers normalize separators
    /// first (see `preferred_path`), because `a/b` and `a//b` are distinct
    /// inputs and would fingerprint differently.
    pub fn of_path(path: &Path) -> Self {
        Self::from_bytes(path.to_string_lossy().as_bytes())
    }

    /// Fingerprints raw bytes with XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:032x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn same_parent_directory_maps_to_one_cache_component() {
        // a.sv and b.sv in the same directory must share a fingerprint
        // component so their caches land side by side.
        let a = PathBuf::from("/proj/rtl/a.sv");
        let b = PathBuf::from("/proj/rtl/b.sv");
        assert_eq!(
            ContentHash::of_path(a.parent().unwrap()),
            ContentHash::of_path(b.parent().unwrap())
        );
    }

    #[test]
    fn sibling_directories_get_distinct_components() {
        assert_ne!(
            ContentHash::of_path(Path::new("/proj/rtl")),
            ContentHash::of_path(Path::new("/proj/tb"))
        );
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        // Save derives the location once, load derives it again; both must
        // agree.
        let at_save = ContentHash::of_path(Path::new("/proj/rtl")).to_string();
        let at_load = ContentHash::of_path(Path::new("/proj/rtl")).to_string();
        assert_eq!(at_save, at_load);
    }

    #[test]
    fn rendering_is_a_safe_directory_name() {
        for path in ["/proj/rtl", "relative/dir", "/", "with space/dir"] {
            let component = ContentHash::of_path(Path::new(path)).to_string();
            assert_eq!(component.len(), 32, "fixed width for {path}");
            assert!(
                component.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
                "hex-only component for {path}"
            );
        }
    }

    #[test]
    fn unnormalized_paths_fingerprint_differently() {
        // The fingerprint is over the rendered bytes; separator
        // normalization is the caller's job.
        assert_ne!(
            ContentHash::of_path(Path::new("/proj/./rtl")),
            ContentHash::of_path(Path::new("/proj/rtl"))
        );
    }

    #[test]
    fn debug_shows_the_full_fingerprint() {
        let h = ContentHash::of_path(Path::new("/proj/rtl"));
        let dbg = format!("{h:?}");
        assert!(dbg.starts_with("ContentHash("));
        assert!(dbg.contains(&h.to_string()));
    }
}
