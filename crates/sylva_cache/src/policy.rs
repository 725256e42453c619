//! The per-invocation cache policy.
//!
//! Everything the cache subsystem needs to know about the current
//! invocation, passed explicitly rather than read from ambient globals:
//! directories, mode flags, and the command-line include paths and defines
//! the validator compares against cached copies.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::NODE_CAPACITY;

/// Cache configuration and shared enable state for one invocation.
///
/// `allowed()` starts at the configured value and can only transition to
/// `false` (capacity exceeded, `-nocache`); the transition is observed by
/// every worker sharing the policy.
#[derive(Debug)]
pub struct CachePolicy {
    /// Root cache directory (`<odir>/<unit-or-all>/cache` by default).
    pub cache_dir: PathBuf,
    /// Root of precompiled packages (`pkg/` next to the executable).
    pub precompiled_dir: PathBuf,
    /// Name of the owning library.
    pub library: String,
    /// Skip hashing and integrity checks (`-nohash`).
    pub no_hash: bool,
    /// Parse-only mode trusts caches without validation (`-parseonly`).
    pub parse_only: bool,
    /// Low-memory mode trusts caches without validation (`-lowmem`).
    pub low_mem: bool,
    /// Producing precompiled package caches (`-createcache`).
    pub create_cache: bool,
    /// Command-line include paths, canonical form, command-line order.
    pub include_paths: Vec<String>,
    /// Command-line defines as sorted `NAME=value` strings.
    pub defines: Vec<String>,
    /// Per-file node cap above which caching is disabled.
    pub node_capacity: usize,
    enabled: AtomicBool,
}

impl CachePolicy {
    /// Creates a policy rooted at `cache_dir` with caching enabled and all
    /// mode flags off.
    pub fn new(cache_dir: PathBuf, precompiled_dir: PathBuf, library: &str) -> Self {
        Self {
            cache_dir,
            precompiled_dir,
            library: library.to_string(),
            no_hash: false,
            parse_only: false,
            low_mem: false,
            create_cache: false,
            include_paths: Vec::new(),
            defines: Vec::new(),
            node_capacity: NODE_CAPACITY,
            enabled: AtomicBool::new(true),
        }
    }

    /// Whether caching is currently allowed.
    pub fn allowed(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sets the initial enable state (from `-nocache`).
    pub fn set_allowed(&self, allowed: bool) {
        self.enabled.store(allowed, Ordering::Release);
    }

    /// Disables caching for the remainder of the invocation.
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// the capacity-exceeded diagnostic is raised exactly once.
    pub fn disable(&self) -> bool {
        self.enabled.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CachePolicy {
        CachePolicy::new(PathBuf::from("/tmp/cache"), PathBuf::from("/opt/pkg"), "work")
    }

    #[test]
    fn starts_enabled_with_defaults() {
        let p = policy();
        assert!(p.allowed());
        assert!(!p.no_hash);
        assert_eq!(p.node_capacity, NODE_CAPACITY);
        assert_eq!(p.library, "work");
    }

    #[test]
    fn disable_reports_transition_once() {
        let p = policy();
        assert!(p.disable());
        assert!(!p.allowed());
        assert!(!p.disable());
    }

    #[test]
    fn set_allowed_false_then_disable_is_not_a_transition() {
        let p = policy();
        p.set_allowed(false);
        assert!(!p.disable());
    }
}
