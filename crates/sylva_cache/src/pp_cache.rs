//! Persist and restore the preprocessed form of a source file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sylva_ast::{
    Design, FileContent, IncludeFileInfo, LineTranslation, MacroDef, PpFileData, TimeInfo,
};
use sylva_common::{Interner, Symbol};
use sylva_diagnostics::Diagnostic;
use sylva_source::fs_utils;

use crate::codec::{self, CacheKind};
use crate::error::CacheError;
use crate::name::cache_file_path;
use crate::policy::CachePolicy;
use crate::precompiled::PrecompiledRegistry;
use crate::records::{
    DiagnosticRecord, IncludeInfoRecord, LineTranslationRecord, MacroRecord, NodeRecord,
    PpCacheRecord, TimeInfoRecord,
};
use crate::symbols::CacheSymbols;
use crate::validator::Validator;
use crate::{PP_EXT, SCHEMA_VERSION};

/// What a save attempt did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SaveOutcome {
    /// A cache file was written.
    Saved,
    /// Caching is off (or the file is virtual); nothing was written.
    Skipped,
    /// The node count exceeded the capacity; caching has just been disabled
    /// for the remainder of the invocation. Reported at most once.
    CapacityExceeded,
}

/// Gate shared by both cache kinds: skip when disabled, disable on the
/// first capacity overflow.
pub(crate) fn save_gate(policy: &CachePolicy, content: Option<&FileContent>) -> Option<SaveOutcome> {
    if !policy.allowed() {
        return Some(SaveOutcome::Skipped);
    }
    if let Some(content) = content {
        if content.node_count() > policy.node_capacity {
            return Some(if policy.disable() {
                SaveOutcome::CapacityExceeded
            } else {
                SaveOutcome::Skipped
            });
        }
    }
    None
}

/// Serializes the preprocessed form of `source`.
///
/// All symbols are re-interned into a fresh cache-local table; macros are
/// written in name order and the include set sorted, so identical inputs
/// produce byte-identical files.
pub fn save(
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    interner: &Interner,
    source: &Path,
    data: &PpFileData,
    content: Option<&FileContent>,
    errors: &[Diagnostic],
) -> Result<SaveOutcome, CacheError> {
    if let Some(outcome) = save_gate(policy, content) {
        return Ok(outcome);
    }

    let cache_path = cache_file_path(policy, prec, source, PP_EXT);
    if let Some(parent) = cache_path.parent() {
        fs_utils::mkdirs(parent);
    }

    let mut syms = CacheSymbols::new();

    let macros: Vec<MacroRecord> = data
        .macros
        .iter()
        .map(|(name, def)| MacroRecord::from_def(name, def))
        .collect();

    let mut includes: Vec<String> = data
        .includes
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    includes.sort();
    includes.dedup();

    let mut record = PpCacheRecord {
        macros,
        includes,
        body: data.body.clone(),
        errors: errors
            .iter()
            .map(|d| DiagnosticRecord::encode(d, interner, &mut syms))
            .collect(),
        cmd_include_paths: policy.include_paths.clone(),
        cmd_defines: policy.defines.clone(),
        time_infos: data
            .time_infos
            .iter()
            .map(|t| TimeInfoRecord::encode(t, interner, &mut syms))
            .collect(),
        line_translations: data
            .line_translations
            .iter()
            .map(|lt| LineTranslationRecord::encode(lt, interner))
            .collect(),
        include_infos: data
            .include_infos
            .iter()
            .map(|i| IncludeInfoRecord::encode(i, interner))
            .collect(),
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
    codec::save_record(&cache_path, CacheKind::Preproc, &header, &record)?;
    Ok(SaveOutcome::Saved)
}

/// Everything a preprocess-cache restore reproduces for the entry file.
///
/// Macros, diagnostics, time infos, line translations and include infos are
/// merged across the entry file and its transitively restored includes, the
/// way the preprocessor would have accumulated them.
#[derive(Debug)]
pub struct RestoredPp {
    /// Macro definitions to re-register, in record order.
    pub macros: Vec<(String, MacroDef)>,
    /// The entry file's preprocessed body.
    pub body: String,
    /// Diagnostics to merge into the invocation sink.
    pub diagnostics: Vec<Diagnostic>,
    /// Time-scale directives to re-register with the compilation unit.
    pub time_infos: Vec<TimeInfo>,
    /// `` `line `` translations.
    pub line_translations: Vec<LineTranslation>,
    /// Include-section boundaries.
    pub include_infos: Vec<IncludeFileInfo>,
    /// The entry file's transitive include set.
    pub includes: Vec<PathBuf>,
    /// The entry file's reconstructed content (nodes).
    pub content: FileContent,
}

/// Restores the preprocess cache for `source` after validating it.
///
/// Included files are restored recursively, cycle-broken by a visited set;
/// each gets its own file content in the design's preprocess registry
/// (created fresh, or reused if another walk already restored it). With
/// `errors_only`, only macros and diagnostics are reproduced.
#[allow(clippy::too_many_arguments)]
pub fn restore(
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    interner: &Interner,
    design: &Design,
    source: &Path,
    library: Symbol,
    errors_only: bool,
) -> Option<RestoredPp> {
    if !policy.allowed() {
        return None;
    }
    if !Validator::new(policy, prec).pp_valid(source) {
        return None;
    }

    let file_sym = interner.register(&source.to_string_lossy());
    let mut restored = RestoredPp {
        macros: Vec::new(),
        body: String::new(),
        diagnostics: Vec::new(),
        time_infos: Vec::new(),
        line_translations: Vec::new(),
        include_infos: Vec::new(),
        includes: Vec::new(),
        content: FileContent::new(file_sym, library),
    };
    let mut visited = HashSet::new();
    if !restore_into(
        policy, prec, interner, design, source, library, errors_only, true, &mut restored,
        &mut visited,
    ) {
        return None;
    }
    Some(restored)
}

/// Applies one cache record into the accumulating restore.
///
/// Returns `false` only when the entry file's record is unreadable; a
/// vanished include record is skipped, matching the fail-safe contract.
#[allow(clippy::too_many_arguments)]
fn restore_into(
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    interner: &Interner,
    design: &Design,
    source: &Path,
    library: Symbol,
    errors_only: bool,
    is_entry: bool,
    restored: &mut RestoredPp,
    visited: &mut HashSet<PathBuf>,
) -> bool {
    let cache_path = cache_file_path(policy, prec, source, PP_EXT);
    if !visited.insert(cache_path.clone()) {
        return true;
    }

    let record = codec::open(&cache_path, CacheKind::Preproc)
        .and_then(|file| file.decode_record::<PpCacheRecord>());
    let Some(record) = record else {
        return !is_entry;
    };
    let syms = CacheSymbols::from_strings(record.symbols);

    for mac in &record.macros {
        restored.macros.push(mac.to_def());
    }
    restored.diagnostics.extend(
        record
            .errors
            .iter()
            .filter_map(|e| e.decode(interner, &syms)),
    );

    if !errors_only {
        restored
            .time_infos
            .extend(record.time_infos.iter().map(|t| t.decode(interner, &syms)));
        restored.line_translations.extend(
            record
                .line_translations
                .iter()
                .map(|lt| lt.decode(interner)),
        );
        restored
            .include_infos
            .extend(record.include_infos.iter().map(|i| i.decode(interner)));
    }

    for include in &record.includes {
        restore_into(
            policy,
            prec,
            interner,
            design,
            Path::new(include),
            library,
            errors_only,
            false,
            restored,
            visited,
        );
    }

    if !errors_only {
        if is_entry {
            restored.body = record.body;
            for obj in &record.objects {
                restored.content.add_node(obj.decode(interner, &syms));
            }
            restored.includes = record.includes.iter().map(PathBuf::from).collect();
        } else {
            let file_sym = interner.register(&source.to_string_lossy());
            if !design.has_pp_content(file_sym) {
                let mut content = FileContent::new(file_sym, library);
                for obj in &record.objects {
                    content.add_node(obj.decode(interner, &syms));
                }
                design.add_pp_content(file_sym, content);
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_ast::{MacroKind, MacroStorage, NodeId, TimeScope, TimeUnit, VObject};
    use sylva_diagnostics::{ErrorKind, Location};

    fn setup() -> (tempfile::TempDir, CachePolicy, PrecompiledRegistry, Interner) {
        let dir = tempfile::tempdir().unwrap();
        let policy = CachePolicy::new(dir.path().join("cache"), dir.path().join("pkg"), "work");
        (dir, policy, PrecompiledRegistry::new(), Interner::new())
    }

    fn sample_data(interner: &Interner, file: &Path) -> PpFileData {
        let mut macros = MacroStorage::new();
        macros.insert(
            "W".to_string(),
            MacroDef {
                kind: MacroKind::NoArgs,
                start_line: 1,
                start_column: 1,
                end_line: 1,
                end_column: 12,
                arguments: vec![],
                tokens: vec!["8".to_string()],
            },
        );
        PpFileData {
            macros,
            includes: Vec::new(),
            body: "module m; logic [8-1:0] x; endmodule\n".to_string(),
            time_infos: vec![TimeInfo {
                scope: TimeScope::File,
                file: interner.register(&file.to_string_lossy()),
                line: 1,
                unit: TimeUnit::Nanosecond,
                unit_value: 1.0,
                precision: TimeUnit::Picosecond,
                precision_value: 1.0,
            }],
            line_translations: Vec::new(),
            include_infos: Vec::new(),
        }
    }

    fn entry_content(interner: &Interner, file: &Path) -> FileContent {
        let file_sym = interner.register(&file.to_string_lossy());
        let lib = interner.register("work");
        let mut content = FileContent::new(file_sym, lib);
        content.add_node(VObject::new(file_sym, 1, file_sym, 1, 1));
        content
    }

    #[test]
    fn save_then_restore_reproduces_fields() {
        let (dir, policy, prec, interner) = setup();
        let source = dir.path().join("top.sv");
        std::fs::write(&source, "`define W 8\nmodule m; endmodule\n").unwrap();
        let data = sample_data(&interner, &source);
        let content = entry_content(&interner, &source);
        let design = Design::new();

        let outcome = save(&policy, &prec, &interner, &source, &data, Some(&content), &[]).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        let lib = interner.register("work");
        let restored = restore(&policy, &prec, &interner, &design, &source, lib, false).unwrap();
        assert_eq!(restored.macros.len(), 1);
        assert_eq!(restored.macros[0].0, "W");
        assert_eq!(restored.macros[0].1.tokens, vec!["8".to_string()]);
        assert_eq!(restored.body, data.body);
        assert_eq!(restored.time_infos.len(), 1);
        assert_eq!(restored.time_infos[0].unit, TimeUnit::Nanosecond);
        // Entry node arena: sentinel + one node.
        assert_eq!(restored.content.node_count(), 2);
        assert!(restored.content.node(NodeId::INVALID).is_none());
    }

    #[test]
    fn empty_file_roundtrip() {
        let (dir, policy, prec, interner) = setup();
        let source = dir.path().join("empty.sv");
        std::fs::write(&source, "").unwrap();
        let design = Design::new();
        let data = PpFileData::default();

        let outcome = save(&policy, &prec, &interner, &source, &data, None, &[]).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        let lib = interner.register("work");
        let restored = restore(&policy, &prec, &interner, &design, &source, lib, false).unwrap();
        assert!(restored.macros.is_empty());
        assert!(restored.includes.is_empty());
        assert!(restored.body.is_empty());
        assert_eq!(restored.content.node_count(), 1);
    }

    #[test]
    fn save_skipped_when_disabled() {
        let (dir, policy, prec, interner) = setup();
        policy.set_allowed(false);
        let source = dir.path().join("top.sv");
        std::fs::write(&source, "").unwrap();
        let outcome = save(
            &policy,
            &prec,
            &interner,
            &source,
            &PpFileData::default(),
            None,
            &[],
        )
        .unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped);
        assert!(!cache_file_path(&policy, &prec, &source, PP_EXT).exists());
    }

    #[test]
    fn capacity_overflow_disables_caching_once() {
        let (dir, mut policy, prec, interner) = setup();
        policy.node_capacity = 2;
        let source = dir.path().join("big.sv");
        std::fs::write(&source, "").unwrap();
        let mut content = entry_content(&interner, &source);
        content.add_node(VObject::invalid());
        content.add_node(VObject::invalid());
        assert!(content.node_count() > 2);

        let first = save(
            &policy,
            &prec,
            &interner,
            &source,
            &PpFileData::default(),
            Some(&content),
            &[],
        )
        .unwrap();
        assert_eq!(first, SaveOutcome::CapacityExceeded);
        assert!(!policy.allowed());

        let second = save(
            &policy,
            &prec,
            &interner,
            &source,
            &PpFileData::default(),
            Some(&content),
            &[],
        )
        .unwrap();
        assert_eq!(second, SaveOutcome::Skipped);
    }

    #[test]
    fn errors_roundtrip_through_cache_local_symbols() {
        let (dir, policy, prec, interner) = setup();
        let source = dir.path().join("top.sv");
        std::fs::write(&source, "").unwrap();
        let file_sym = interner.register(&source.to_string_lossy());
        let errors = vec![Diagnostic::new(
            ErrorKind::PpSyntaxError,
            Location::in_file(file_sym, 4, 2),
        )];

        save(
            &policy,
            &prec,
            &interner,
            &source,
            &PpFileData::default(),
            None,
            &errors,
        )
        .unwrap();

        // A fresh interner simulates a later invocation: handles renumber
        // but strings survive.
        let interner2 = Interner::new();
        let design = Design::new();
        let lib = interner2.register("work");
        let restored =
            restore(&policy, &prec, &interner2, &design, &source, lib, true).unwrap();
        assert_eq!(restored.diagnostics.len(), 1);
        let diag = restored.diagnostics[0];
        assert_eq!(diag.kind, ErrorKind::PpSyntaxError);
        assert_eq!(
            interner2.symbol(diag.loc.file),
            source.to_string_lossy().as_ref()
        );
        assert_eq!(diag.loc.line, 4);
    }

    #[test]
    fn errors_only_restore_skips_body_and_nodes() {
        let (dir, policy, prec, interner) = setup();
        let source = dir.path().join("top.sv");
        std::fs::write(&source, "x").unwrap();
        let data = sample_data(&interner, &source);
        let content = entry_content(&interner, &source);
        save(&policy, &prec, &interner, &source, &data, Some(&content), &[]).unwrap();

        let design = Design::new();
        let lib = interner.register("work");
        let restored = restore(&policy, &prec, &interner, &design, &source, lib, true).unwrap();
        assert!(restored.body.is_empty());
        assert_eq!(restored.content.node_count(), 1);
        assert!(restored.time_infos.is_empty());
        // Macros are always restored.
        assert_eq!(restored.macros.len(), 1);
    }

    #[test]
    fn includes_restore_recursively_into_design() {
        let (dir, policy, prec, interner) = setup();
        let top = dir.path().join("top.sv");
        let inc = dir.path().join("inc.svh");
        std::fs::write(&top, "`include \"inc.svh\"\n").unwrap();
        std::fs::write(&inc, "`define FROM_INC 1\n").unwrap();

        // Save the include's own cache.
        let mut inc_macros = MacroStorage::new();
        inc_macros.insert(
            "FROM_INC".to_string(),
            MacroDef {
                kind: MacroKind::NoArgs,
                start_line: 1,
                start_column: 1,
                end_line: 1,
                end_column: 18,
                arguments: vec![],
                tokens: vec!["1".to_string()],
            },
        );
        let inc_data = PpFileData {
            macros: inc_macros,
            ..Default::default()
        };
        let inc_content = entry_content(&interner, &inc);
        save(&policy, &prec, &interner, &inc, &inc_data, Some(&inc_content), &[]).unwrap();

        // Save the top file referencing the include.
        let top_data = PpFileData {
            includes: vec![inc.clone()],
            body: "`define FROM_INC 1\n".to_string(),
            ..Default::default()
        };
        let top_content = entry_content(&interner, &top);
        save(&policy, &prec, &interner, &top, &top_data, Some(&top_content), &[]).unwrap();

        let design = Design::new();
        let lib = interner.register("work");
        let restored = restore(&policy, &prec, &interner, &design, &top, lib, false).unwrap();

        // The include's macro was merged into the entry restore.
        assert!(restored.macros.iter().any(|(n, _)| n == "FROM_INC"));
        assert_eq!(restored.includes, vec![inc.clone()]);
        // The include got its own content in the design registry.
        let inc_sym = interner.register(&inc.to_string_lossy());
        assert!(design.has_pp_content(inc_sym));
    }
}
