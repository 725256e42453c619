//! Registry of precompiled packages shipped alongside the binary.
//!
//! Caches for these files live in the precompiled root rather than the
//! invocation's cache directory and are trusted on a header match alone.

use std::collections::HashSet;

/// The set of file basenames whose caches are precompiled.
///
/// Owned by the per-invocation session and passed explicitly to the cache
/// subsystem; never a process-wide singleton.
#[derive(Debug, Default)]
pub struct PrecompiledRegistry {
    names: HashSet<String>,
}

impl PrecompiledRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a precompiled file by basename (e.g. `uvm_pkg.sv`).
    pub fn register(&mut self, basename: &str) {
        self.names.insert(basename.to_string());
    }

    /// Whether the given basename has a precompiled cache.
    pub fn is_precompiled(&self, basename: &str) -> bool {
        self.names.contains(basename)
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no packages are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
