//! One full compilation: command-line normalization, then per-file
//! preprocessing and parsing, each stage guarded by the persistent cache.
//!
//! Files are processed by a bounded worker pool sized by `-mt`. Workers
//! keep per-file diagnostic batches and merge them into the shared sink at
//! the end of each work unit; the sink's fatal flag is the only
//! cross-worker cancellation signal, checked at work-unit boundaries.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;

use sylva_ast::Design;
use sylva_cache::{parse_cache, pp_cache, CachePolicy, PrecompiledRegistry, SaveOutcome, PP_EXT};
use sylva_cmd::{normalize, CommandOptions};
use sylva_common::{Interner, Symbol};
use sylva_diagnostics::{
    Diagnostic, DiagnosticSink, ErrorKind, Location, LogFile, Stats,
};
use sylva_frontend::{parse_source, parse_timescale, CompilationUnit, Preprocessor};
use sylva_source::fs_utils;

use crate::build_identifier;

/// Runs one compilation from raw arguments.
///
/// Returns the return-code bitmask (bit 0 fatal, bit 1 syntax, bit 2
/// error) and the invocation's statistics for batch accumulation.
pub fn execute_compilation(args: &[String]) -> (u32, Stats) {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let opts = normalize(args, &interner, &sink);

    if opts.help {
        println!("usage: sylva [options] <files>...   (see the project README)");
        return (0, Stats::default());
    }
    if opts.version {
        println!("{}", build_identifier());
        return (0, Stats::default());
    }

    let log = LogFile::new(&opts.log_file);
    log.write_header(&build_identifier(), args);

    if !sink.has_fatal() {
        run_stages(&opts, &interner, &sink);
    }

    let stats = sink.stats();
    log.write_diagnostics(&sink.diagnostics(), &interner);
    log.write_footer(&stats);

    let mut code = stats.return_code();
    if let Some(exe) = &opts.exe_command {
        code |= run_post_command(exe, &opts.full_compile_dir);
    }
    (code, stats)
}

fn run_stages(opts: &CommandOptions, interner: &Interner, sink: &DiagnosticSink) {
    let unit = CompilationUnit::new();
    if let Some(ts) = opts.timescale.as_deref().and_then(parse_timescale) {
        unit.record_time_info(ts);
    }
    let design = Design::new();
    let policy = opts.cache_policy(sylva_ast::DEFAULT_LIBRARY);
    let prec = discover_precompiled_packages(&policy);
    let library = interner.register(sylva_ast::DEFAULT_LIBRARY);
    let pp_files: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    let workers = opts.max_threads.max(1) as usize;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build();
    let run_all = || {
        opts.source_files.par_iter().for_each(|file| {
            if sink.has_fatal() {
                // Drain remaining units cheaply once a fatal error is seen.
                return;
            }
            let diags = compile_one_file(
                opts, interner, &unit, &design, &policy, &prec, library, file, &pp_files,
            );
            sink.extend(diags);
        });
    };
    match pool {
        Ok(pool) => pool.install(run_all),
        Err(_) => run_all(),
    }

    if opts.write_pp {
        let mut files = pp_files.into_inner().unwrap();
        files.sort();
        let list: String = files
            .iter()
            .map(|p| format!("{}\n", p.display()))
            .collect();
        let _ = std::fs::write(opts.full_compile_dir.join("file.lst"), list);
    }
}

/// Preprocess (cache-guarded), then parse (cache-guarded), one file.
/// Returns the worker's diagnostic batch for the stage-barrier merge.
#[allow(clippy::too_many_arguments)]
fn compile_one_file(
    opts: &CommandOptions,
    interner: &Interner,
    unit: &CompilationUnit,
    design: &Design,
    policy: &CachePolicy,
    prec: &PrecompiledRegistry,
    library: Symbol,
    file: &Path,
    pp_files: &Mutex<Vec<PathBuf>>,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let file_sym = interner.register(&file.to_string_lossy());

    // Preprocess stage: restore on hit, run and save on miss.
    let body = match pp_cache::restore(policy, prec, interner, design, file, library, false) {
        Some(restored) => {
            diags.extend(restored.diagnostics.iter().copied());
            for info in &restored.time_infos {
                unit.record_time_info(*info);
            }
            let body = restored.body.clone();
            design.add_pp_content(file_sym, restored.content);
            body
        }
        None => {
            let include_paths = opts.include_paths.clone();
            let pp = Preprocessor::new(interner, unit, &include_paths, library)
                .with_defines(&opts.defines);
            let mut outputs = pp.preprocess(file);
            let body = outputs
                .first()
                .map(|o| o.data.body.clone())
                .unwrap_or_default();
            for output in outputs.drain(..) {
                match pp_cache::save(
                    policy,
                    prec,
                    interner,
                    &output.source,
                    &output.data,
                    Some(&output.content),
                    &output.diagnostics,
                ) {
                    Ok(SaveOutcome::CapacityExceeded) => diags.push(Diagnostic::new(
                        ErrorKind::CmdCacheCapacityExceeded,
                        Location::none(),
                    )),
                    Ok(_) => {}
                    Err(_) => {
                        // Cache write failures degrade to uncached runs.
                    }
                }
                diags.extend(output.diagnostics.iter().copied());
                let out_sym = interner.register(&output.source.to_string_lossy());
                design.add_pp_content(out_sym, output.content);
            }
            body
        }
    };

    if opts.write_pp {
        let pp_path = opts
            .full_compile_dir
            .join(format!("{}.pp", fs_utils::basename(file)));
        if std::fs::write(&pp_path, &body).is_ok() {
            pp_files.lock().unwrap().push(pp_path);
        }
    }

    if !opts.parse {
        return diags;
    }

    // Parse stage.
    match parse_cache::restore(policy, prec, interner, design, file, library) {
        Some(restored) => {
            diags.extend(restored.diagnostics.iter().copied());
        }
        None => {
            let output = parse_source(interner, unit, file, &body, library);
            match parse_cache::save(
                policy,
                prec,
                interner,
                file,
                Some(&output.content),
                &output.diagnostics,
            ) {
                Ok(SaveOutcome::CapacityExceeded) => diags.push(Diagnostic::new(
                    ErrorKind::CmdCacheCapacityExceeded,
                    Location::none(),
                )),
                Ok(_) => {}
                Err(_) => {}
            }
            diags.extend(output.diagnostics.iter().copied());
            design.add_parse_content(file_sym, output.content);
        }
    }

    diags
}

/// Registers every cache already present in the precompiled root, so those
/// basenames are trusted on a header match alone.
fn discover_precompiled_packages(policy: &CachePolicy) -> PrecompiledRegistry {
    let mut prec = PrecompiledRegistry::new();
    if let Ok(entries) = std::fs::read_dir(&policy.precompiled_dir) {
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(PP_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prec.register(stem);
                }
            }
        }
    }
    prec
}

/// Runs the `-exe` post command with the preprocessor file list appended.
fn run_post_command(command: &str, compile_dir: &Path) -> u32 {
    let file_list = compile_dir.join("file.lst");
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return 0;
    };
    let status = std::process::Command::new(program)
        .args(parts)
        .arg(&file_list)
        .status();
    match status {
        Ok(status) if status.success() => 0,
        _ => 0x1,
    }
}
