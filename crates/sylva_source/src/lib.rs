//! Filesystem utilities for the Sylva frontend.
//!
//! Path canonicalization, directory management, and the deterministic path
//! fingerprint used as a cache-directory component.

#![warn(missing_docs)]

pub mod fs_utils;

pub use fs_utils::{
    basename, exists, hash_path, is_directory, mkdirs, parent_dir, preferred_path, rm_recursive,
};
