//! Cache validity decisions.
//!
//! Given a candidate cache file, decide hit or miss for the current
//! invocation. The decision short-circuits top to bottom: configuration
//! gates first, then buffer framing, then header integrity, then equality
//! of the command-line include-path and define sets, then recursive
//! validity of every transitively included file. The walk carries a
//! visited set so include cycles terminate (a revisited file counts as a
//! hit for the walk).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sylva_source::fs_utils;

use crate::codec::{self, CacheKind};
use crate::name::cache_file_path;
use crate::policy::CachePolicy;
use crate::precompiled::PrecompiledRegistry;
use crate::records::PpCacheRecord;
use crate::{PARSE_EXT, PP_EXT, SCHEMA_VERSION};

/// Set equality tolerant to permutation: both sides are copied, sorted and
/// compared elementwise.
pub fn set_equal(a: &[String], b: &[String]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// One validation walk over a file and its transitive includes.
pub struct Validator<'a> {
    policy: &'a CachePolicy,
    prec: &'a PrecompiledRegistry,
    visited: HashSet<PathBuf>,
}

impl<'a> Validator<'a> {
    /// Starts a fresh walk (empty visited set).
    pub fn new(policy: &'a CachePolicy, prec: &'a PrecompiledRegistry) -> Self {
        Self {
            policy,
            prec,
            visited: HashSet::new(),
        }
    }

    /// Decides whether the preprocess cache for `source` is a hit.
    pub fn pp_valid(&mut self, source: &Path) -> bool {
        if !self.policy.allowed() {
            return false;
        }
        if self.policy.parse_only || self.policy.low_mem {
            return true;
        }

        let cache_path = cache_file_path(self.policy, self.prec, source, PP_EXT);
        if !self.visited.insert(cache_path.clone()) {
            return true;
        }

        let Some(file) = codec::open(&cache_path, CacheKind::Preproc) else {
            return false;
        };
        if self.policy.no_hash {
            return true;
        }
        if !codec::check_header(&file.header, SCHEMA_VERSION, &cache_path) {
            return false;
        }
        if self.prec.is_precompiled(&fs_utils::basename(source)) {
            return true;
        }

        let Some(record) = file.decode_record::<PpCacheRecord>() else {
            return false;
        };
        if !set_equal(&record.cmd_include_paths, &self.policy.include_paths) {
            return false;
        }
        if !set_equal(&record.cmd_defines, &self.policy.defines) {
            return false;
        }
        record
            .includes
            .iter()
            .all(|include| self.pp_valid(Path::new(include)))
    }

    /// Decides whether the parse cache for `source` is a hit.
    ///
    /// The parse cache depends only on the preprocessor's output, so there
    /// is no include-set comparison and no recursion.
    pub fn parse_valid(&mut self, source: &Path) -> bool {
        if !self.policy.allowed() {
            return false;
        }

        let cache_path = cache_file_path(self.policy, self.prec, source, PARSE_EXT);
        let Some(file) = codec::open(&cache_path, CacheKind::Parse) else {
            return false;
        };
        if self.policy.no_hash {
            return true;
        }
        if self.prec.is_precompiled(&fs_utils::basename(source)) {
            return file.header.schema_version == SCHEMA_VERSION;
        }
        codec::check_header(&file.header, SCHEMA_VERSION, &cache_path)
    }
}
