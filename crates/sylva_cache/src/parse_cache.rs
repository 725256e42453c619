//! Persist and restore the post-parse form of a source file.
//!
//! A smaller payload than the preprocess cache: errors, the cache-local
//! symbol table, the design-element list with per-element time info, and
//! the parse-tree nodes. No transitive recursion — the parse cache depends
//! only on the preprocessor's output.

use std::path::Path;

use sylva_ast::{Design, FileContent};
use sylva_common::{symbol::BAD_SYMBOL_TEXT, Interner, Symbol};
use sylva_diagnostics::Diagnostic;
use sylva_source::fs_utils;

use crate::codec::{self, CacheKind};
use crate::error::CacheError;
use crate::name::cache_file_path;
use crate::policy::CachePolicy;
use crate::pp_cache::{save_gate, SaveOutcome};
use crate::precompiled::PrecompiledRegistry;
use crate::records::{DiagnosticRecord, ElementRecord, NodeRecord, ParseCacheRecord};
use crate::symbols::CacheSymbols;
use crate::validator::Validator;
use crate::{PARSE_EXT, SCHEMA_VERSION};

/// Serializes the parsed form of `source`.
///
/// A cache path containing the bad-symbol token names a virtual file
/// (builtin classes and the like): the save is refused and silently treated
/// as success.
pub fn save(
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    interner: &Interner,
    source: &Path,
    content: Option<&FileContent>,
    errors: &[Diagnostic],
) -> Result<SaveOutcome, CacheError> {
    if let Some(outcome) = save_gate(policy, content) {
        return Ok(outcome);
    }

    let cache_path = cache_file_path(policy, prec, source, PARSE_EXT);
    if cache_path.to_string_lossy().contains(BAD_SYMBOL_TEXT) {
        return Ok(SaveOutcome::Skipped);
    }
    if let Some(parent) = cache_path.parent() {
        fs_utils::mkdirs(parent);
    }

    let mut syms = CacheSymbols::new();
    let mut record = ParseCacheRecord {
        errors: errors
            .iter()
            .map(|d| DiagnosticRecord::encode(d, interner, &mut syms))
            .collect(),
        elements: content
            .map(|c| {
                c.design_elements()
                    .iter()
                    .map(|e| ElementRecord::encode(e, interner, &mut syms))
                    .collect()
            })
            .unwrap_or_default(),
        objects: content
            .map(|c| {
                c.nodes()
                    .map(|(_, obj)| NodeRecord::encode(obj, interner, &mut syms))
                    .collect()
            })
            .unwrap_or_default(),
        symbols: Vec::new(),
    };
    record.symbols = syms.into_strings();

    let header = codec::create_header(SCHEMA_VERSION, source);
    codec::save_record(&cache_path, CacheKind::Parse, &header, &record)?;
    Ok(SaveOutcome::Saved)
}

/// A restored parse stage: the reconstructed file content and the
/// diagnostics to merge back.
#[derive(Debug)]
pub struct RestoredParse {
    /// Nodes and design elements, re-interned into the canonical table.
    pub content: FileContent,
    /// Diagnostics carried by the cache.
    pub diagnostics: Vec<Diagnostic>,
}

/// Restores the parse cache for `source` after validating it.
///
/// Design elements are re-inserted under their `<library>@<name>` keys. The
/// restored content is also registered in the design's parse registry.
pub fn restore(
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    interner: &Interner,
    design: &Design,
    source: &Path,
    library: Symbol,
) -> Option<RestoredParse> {
    if !policy.allowed() {
        return None;
    }
    if !Validator::new(policy, prec).parse_valid(source) {
        return None;
    }

    let cache_path = cache_file_path(policy, prec, source, PARSE_EXT);
    let record = codec::open(&cache_path, CacheKind::Parse)?.decode_record::<ParseCacheRecord>()?;
    let syms = CacheSymbols::from_strings(record.symbols);

    let file_sym = interner.register(&source.to_string_lossy());
    let build_content = || {
        let mut content = FileContent::new(file_sym, library);
        for obj in &record.objects {
            content.add_node(obj.decode(interner, &syms));
        }
        for rec in &record.elements {
            let elem = rec.decode(interner, &syms);
            let key = content.qualify(interner, elem.name);
            content.add_design_element(&key, elem);
        }
        content
    };

    let diagnostics: Vec<Diagnostic> = record
        .errors
        .iter()
        .filter_map(|e| e.decode(interner, &syms))
        .collect();

    design.add_parse_content(file_sym, build_content());

    Some(RestoredParse {
        content: build_content(),
        diagnostics,
    })
}
