//! The argument normalizer.
//!
//! Runs in phases, mirroring how derived paths depend on earlier flags:
//! a pre-scan for mode switches and `-D` registrations, the output-directory
//! scan, argument-file expansion, compile-directory preparation, the main
//! switch table, cache-directory setup, and the final existence-validation
//! pass.

use std::path::{Path, PathBuf};

use sylva_common::Interner;
use sylva_diagnostics::{Diagnostic, DiagnosticSink, ErrorKind, Location};
use sylva_source::fs_utils;

use crate::env::EnvMap;
use crate::options::{CommandOptions, CACHE_DIR, PRECOMPILED_DIR};

/// Recursion cap for `-f` argument files.
const MAX_ARG_FILE_DEPTH: usize = 64;

/// Upper bound on requested workers.
const MAX_WORKERS: u32 = 512;

/// Normalizes a raw argument vector into [`CommandOptions`].
///
/// Problems are reported through `sink`; normalization continues past
/// input errors so one bad argument does not hide the rest.
pub fn normalize(args: &[String], interner: &Interner, sink: &DiagnosticSink) -> CommandOptions {
    Normalizer {
        interner,
        sink,
        env: EnvMap::new(),
        opts: CommandOptions::default(),
        log_override: None,
    }
    .run(args)
}

struct Normalizer<'a> {
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    env: EnvMap,
    opts: CommandOptions,
    log_override: Option<PathBuf>,
}

/// Strips surrounding whitespace and matched single or double quotes.
pub fn undecorate(arg: &str) -> &str {
    let mut arg = arg.trim();
    if arg.len() > 1 {
        let bytes = arg.as_bytes();
        let quoted = (bytes[0] == b'"' && bytes[arg.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[arg.len() - 1] == b'\'');
        if quoted {
            arg = arg[1..arg.len() - 1].trim();
        }
    }
    arg
}

/// Removes `//` and `#` comments from an argument file.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = match line.find("//") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        out.push_str(line);
        out.push('\n');
    }
    out
}

impl<'a> Normalizer<'a> {
    fn report(&self, kind: ErrorKind, object: &str) {
        self.sink.emit(Diagnostic::new(
            kind,
            Location::object(self.interner.register(object)),
        ));
    }

    fn run(mut self, args: &[String]) -> CommandOptions {
        // Pre-scan: mode switches that gate everything downstream, and -D
        // registrations so later -f expansion sees them.
        let mut i = 0;
        while i < args.len() {
            let arg = undecorate(&args[i]);
            match arg {
                "-help" | "-h" | "--help" => {
                    self.opts.help = true;
                    return self.opts;
                }
                "--version" => {
                    self.opts.version = true;
                    return self.opts;
                }
                "-cd" => {
                    if let Some(dir) = args.get(i + 1) {
                        let _ = std::env::set_current_dir(undecorate(dir));
                        i += 1;
                    }
                }
                "-builtin" => {
                    if let Some(path) = args.get(i + 1) {
                        self.opts.builtin_path = Some(PathBuf::from(undecorate(path)));
                        i += 1;
                    }
                }
                "-l" => {
                    if let Some(file) = args.get(i + 1) {
                        self.log_override = Some(PathBuf::from(undecorate(file)));
                        i += 1;
                    } else {
                        self.report(ErrorKind::CmdMissingLogFile, arg);
                    }
                }
                "-fileunit" => self.opts.file_unit = true,
                "-nostdout" => self.opts.mute_stdout = true,
                _ => {
                    if let Some(rest) = arg.strip_prefix("-D") {
                        self.define(rest);
                    }
                }
            }
            i += 1;
        }

        self.process_output_directory(args);
        self.discover_precompiled();

        let mut expanded = Vec::new();
        self.process_args(args, &mut expanded, 0);

        self.prepare_compilation();
        self.main_loop(&expanded);
        self.setup_cache();
        self.check_command_line();
        self.opts
    }

    /// Early scan so later derived paths (log file, cache directory) use
    /// the right root.
    fn process_output_directory(&mut self, args: &[String]) {
        let mut i = 0;
        while i < args.len() {
            let arg = undecorate(&args[i]);
            if arg == "-odir" || arg == "-o" || arg == "--Mdir" {
                match args.get(i + 1) {
                    Some(dir) => {
                        self.opts.output_dir = fs_utils::preferred_path(Path::new(undecorate(dir)));
                        i += 1;
                    }
                    None => self.report(ErrorKind::CmdMissingOutputDir, arg),
                }
            }
            i += 1;
        }
    }

    /// Finds the precompiled package root next to the executable.
    fn discover_precompiled(&mut self) {
        if let Some(builtin) = &self.opts.builtin_path {
            self.opts.precompiled_dir = builtin.join(PRECOMPILED_DIR);
            return;
        }
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let candidates = [
            exe_dir.join(PRECOMPILED_DIR),
            exe_dir.join("..").join("lib").join("sylva").join(PRECOMPILED_DIR),
        ];
        self.opts.precompiled_dir = candidates
            .iter()
            .find(|dir| fs_utils::is_directory(dir))
            .map(|dir| fs_utils::preferred_path(dir))
            .unwrap_or_else(|| exe_dir.join(PRECOMPILED_DIR));
    }

    /// Expands `-f` argument files (and `-link` separate-compile lists)
    /// into a flat argument vector.
    fn process_args(&mut self, args: &[String], out: &mut Vec<String>, depth: usize) {
        let mut i = 0;
        while i < args.len() {
            let arg = undecorate(&args[i]).to_string();
            if arg == "-f" {
                i += 1;
                match args.get(i) {
                    Some(file) => self.expand_arg_file(Path::new(undecorate(file)), out, depth),
                    None => self.report(ErrorKind::CmdArgFileDoesNotExist, "-f"),
                }
            } else if arg == "-link" {
                self.opts.link = true;
                self.opts.parse = true;
                self.opts.compile = true;
                self.opts.elaborate = true;
                self.opts.write_pp = true;
                let odir = self.opts.output_dir.join(self.opts.unit_dir_name());
                if let Ok(entries) = std::fs::read_dir(&odir) {
                    let mut lists: Vec<PathBuf> = entries
                        .filter_map(|e| e.ok())
                        .map(|e| e.path())
                        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("sep_lst"))
                        .collect();
                    lists.sort();
                    for list in lists {
                        self.expand_arg_file(&list, out, depth);
                    }
                }
            } else if !arg.is_empty() {
                out.push(arg);
            }
            i += 1;
        }
    }

    fn expand_arg_file(&mut self, file: &Path, out: &mut Vec<String>, depth: usize) {
        if depth >= MAX_ARG_FILE_DEPTH {
            self.report(
                ErrorKind::CmdArgFileRecursionLimit,
                &file.to_string_lossy(),
            );
            return;
        }
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(_) => {
                self.report(ErrorKind::CmdArgFileDoesNotExist, &file.to_string_lossy());
                return;
            }
        };
        let text = strip_comments(&text);
        let text = self.env.expand(&text);
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        self.process_args(&tokens, out, depth + 1);
    }

    /// Resolves the compile directory and log file; must run before the
    /// main loop so flags that derive paths see them.
    fn prepare_compilation(&mut self) {
        let odir = self.opts.output_dir.join(self.opts.unit_dir_name());
        self.opts.full_compile_dir = fs_utils::preferred_path(&odir);
        if !fs_utils::mkdirs(&self.opts.full_compile_dir) {
            self.report(
                ErrorKind::CmdCannotCreateOutputDir,
                &self.opts.full_compile_dir.to_string_lossy(),
            );
        }

        let log = match &self.log_override {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.opts.full_compile_dir.join(path),
            None => self
                .opts
                .full_compile_dir
                .join(sylva_diagnostics::log_file::DEFAULT_LOG_FILE_NAME),
        };
        self.opts.log_file = fs_utils::preferred_path(&log);
        self.report(
            ErrorKind::CmdCreatingLogFile,
            &self.opts.log_file.to_string_lossy(),
        );
    }

    fn define(&mut self, text: &str) {
        let (name, value) = match text.split_once('=') {
            Some((name, value)) => (name, value),
            None => (text, ""),
        };
        if !name.is_empty() {
            self.env.set(name, value);
            self.opts.defines.insert(name.to_string(), value.to_string());
        }
    }

    fn plus_argument(&mut self, arg: &str) -> bool {
        let mut segments = arg.split('+').skip(1);
        match segments.next() {
            Some("incdir") => {
                for dir in segments.filter(|s| !s.is_empty()) {
                    self.opts.add_include_path(Path::new(dir));
                }
                true
            }
            Some("libext") => {
                self.opts.library_extensions =
                    segments.filter(|s| !s.is_empty()).map(str::to_string).collect();
                true
            }
            Some("define") => {
                for def in segments.filter(|s| !s.is_empty()) {
                    self.define(def);
                }
                true
            }
            Some("liborder") | Some("librescan") | Some("libverbose") | Some("nolibcell") => true,
            _ => false,
        }
    }

    fn parse_workers(&mut self, flag: &str, value: Option<&String>) {
        let Some(value) = value else {
            self.report(ErrorKind::CmdMissingThreadCount, flag);
            return;
        };
        let count = if value == "max" {
            std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1)
        } else {
            match value.parse::<u32>() {
                Ok(n) => n,
                Err(_) => {
                    self.report(ErrorKind::CmdInvalidThreadCount, value);
                    return;
                }
            }
        };
        if count > MAX_WORKERS {
            self.report(ErrorKind::CmdInvalidThreadCount, value);
            return;
        }
        let thread_request = flag != "-mp";
        if thread_request || cfg!(windows) {
            // Process requests are coerced to threads on Windows.
            self.opts.max_threads = count;
        } else {
            self.opts.max_processes = count;
        }
    }

    fn main_loop(&mut self, args: &[String]) {
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            let next = args.get(i + 1);
            match arg {
                "" => {}
                _ if arg.starts_with('+') => {
                    if !self.plus_argument(arg) {
                        self.report(ErrorKind::CmdPlusArgIgnored, arg);
                    }
                }
                "-d" => match next {
                    None => self.report(ErrorKind::CmdMissingDebugLevel, arg),
                    Some(level) => {
                        i += 1;
                        match level.as_str() {
                            "ast" | "inst" | "lib" | "incl" | "uhdm" | "uhdmstats" | "cache"
                            | "coveruhdm" | "vpi_ids" | "coverelab" => {}
                            _ => match level.parse::<u8>() {
                                Ok(n) if n <= 4 => self.opts.debug_level = n,
                                _ => self.report(ErrorKind::CmdInvalidDebugLevel, level),
                            },
                        }
                    }
                },
                _ if arg.starts_with("-timescale=") => {
                    let ts = &arg["-timescale=".len()..];
                    if ts.is_empty() {
                        self.report(ErrorKind::CmdMissingTimescale, arg);
                    } else {
                        self.opts.timescale = Some(ts.to_string());
                    }
                }
                _ if arg.starts_with("-pvalue+") => {
                    let text = &arg["-pvalue+".len()..];
                    if let Some((name, value)) = text.split_once('=') {
                        self.opts.params.insert(name.to_string(), value.to_string());
                    }
                }
                _ if arg.starts_with("-D") => self.define(&arg[2..]),
                _ if arg.starts_with("-P") => {
                    let text = &arg[2..];
                    let (name, value) = text.split_once('=').unwrap_or((text, ""));
                    if !name.is_empty() {
                        self.opts.params.insert(name.to_string(), value.to_string());
                    }
                }
                "-I" => match next {
                    Some(dir) => {
                        self.opts.add_include_path(Path::new(dir.as_str()));
                        i += 1;
                    }
                    None => self.report(ErrorKind::CmdIncludePathDoesNotExist, arg),
                },
                _ if arg.starts_with("-I") => {
                    self.opts.add_include_path(Path::new(&arg[2..]));
                }
                "-split" => {
                    if let Some(n) = next {
                        i += 1;
                        if let Ok(n) = n.parse() {
                            self.opts.split_lines = n;
                        }
                    }
                }
                "-cd" | "-builtin" | "-odir" | "--Mdir" | "-l" | "-writeppfile" | "-batch" => {
                    // Values consumed in earlier phases (or recorded only
                    // for side effects); skip them here.
                    if next.is_some() {
                        i += 1;
                    }
                }
                "-exe" => {
                    if let Some(cmd) = next {
                        self.opts.exe_command = Some(cmd.clone());
                        i += 1;
                    }
                }
                "-lowmem" => {
                    if cfg!(windows) {
                        self.report(ErrorKind::CmdMinusArgIgnored, arg);
                    } else {
                        self.opts.low_mem = true;
                        self.opts.write_pp = true;
                        self.opts.max_processes = 1;
                    }
                }
                "-mt" | "--threads" | "-mp" => {
                    self.parse_workers(arg, next);
                    if next.is_some() {
                        i += 1;
                    }
                }
                "-top" | "--top-module" => {
                    if let Some(top) = next {
                        self.opts.top_modules.push(top.clone());
                        i += 1;
                    }
                }
                "-L" => {
                    if let Some(lib) = next {
                        self.opts.ordered_libraries.push(lib.clone());
                        i += 1;
                    }
                }
                "-map" => {
                    if let Some(file) = next {
                        self.opts.map_files.push(PathBuf::from(file));
                        i += 1;
                    }
                }
                "-cfgfile" => {
                    if let Some(file) = next {
                        self.opts.config_files.push(PathBuf::from(file));
                        i += 1;
                    }
                }
                "-cfg" => {
                    if let Some(cfg) = next {
                        self.opts.use_configs.push(cfg.clone());
                        i += 1;
                    }
                }
                "-v" => match next {
                    Some(file) => {
                        self.opts
                            .library_files
                            .push(fs_utils::preferred_path(Path::new(file.as_str())));
                        i += 1;
                    }
                    None => self.report(ErrorKind::CmdLibraryFileDoesNotExist, arg),
                },
                "-y" => match next {
                    Some(path) => {
                        self.opts
                            .library_paths
                            .push(fs_utils::preferred_path(Path::new(path.as_str())));
                        i += 1;
                    }
                    None => self.report(ErrorKind::CmdLibraryPathDoesNotExist, arg),
                },
                "-cache" => match next {
                    Some(dir) => {
                        self.opts.cache_dir = fs_utils::preferred_path(Path::new(dir.as_str()));
                        i += 1;
                    }
                    None => self.report(ErrorKind::CmdMissingCacheDir, arg),
                },
                "-nohash" => self.opts.no_cache_hash = true,
                "-createcache" => self.opts.create_cache = true,
                "-nocache" => self.opts.cache_allowed = false,
                "-init" => self.opts.cache_allowed = false,
                "-writepp" => self.opts.write_pp = true,
                "-noinfo" => self.opts.info = false,
                "-nonote" => self.opts.note = false,
                "-nowarning" => self.opts.warning = false,
                "-verbose" => self.opts.verbose = true,
                "-nostdout" | "-mutestdout" => self.opts.mute_stdout = true,
                "-sverilog" => self.opts.sverilog = true,
                "-fileunit" => {
                    // Already applied in the pre-scan.
                    self.report(ErrorKind::CmdSeparateCompilationUnitOn, arg);
                }
                "-sv" => match next {
                    Some(file) if Path::new(file.as_str()).is_file() => {
                        let path = fs_utils::preferred_path(Path::new(file.as_str()));
                        self.opts
                            .sv_files
                            .insert(fs_utils::basename(&path));
                        self.add_source_file(&path);
                        i += 1;
                    }
                    _ => self.opts.sverilog = true,
                },
                "-parse" => {
                    self.opts.write_pp = true;
                    self.opts.parse = true;
                    self.opts.compile = true;
                    self.opts.elaborate = true;
                }
                "-parseonly" => {
                    self.opts.write_pp = true;
                    self.opts.parse = true;
                    self.opts.compile = false;
                    self.opts.elaborate = false;
                    self.opts.parse_only = true;
                }
                "-sepcomp" => {
                    self.opts.sep_comp = true;
                    self.opts.write_pp = true;
                    self.opts.parse = true;
                    self.opts.compile = false;
                    self.opts.elaborate = false;
                }
                "-noparse" => {
                    self.opts.parse = false;
                    self.opts.compile = false;
                    self.opts.elaborate = false;
                }
                "-nocomp" => {
                    self.opts.compile = false;
                    self.opts.elaborate = false;
                }
                "-noelab" => self.opts.elaborate = false,
                "-elabuhdm" => {
                    self.opts.elaborate = true;
                    self.opts.elab_uhdm = true;
                }
                "-link" => {}
                "-o" => {
                    self.opts.write_pp = true;
                    self.opts.parse = true;
                    if next.is_some() {
                        i += 1;
                    }
                }
                "--x-assign" | "--x-initial" => {
                    self.report(ErrorKind::CmdPlusArgIgnored, arg);
                    if next.is_some() {
                        i += 1;
                    }
                }
                "-profile" | "-synth" | "-replay" | "-lineoffsetascomments" | "-filterdirectives"
                | "-filterprotected" | "-filtercomments" | "-outputlineinfo" | "-pploc"
                | "-nobuiltin" => {}
                _ if arg.starts_with('-') => self.report(ErrorKind::CmdMinusArgIgnored, arg),
                _ => {
                    let path = fs_utils::preferred_path(Path::new(arg));
                    self.add_source_file(&path);
                }
            }
            i += 1;
        }
    }

    /// Registers a source file and its parent directory as an include path.
    fn add_source_file(&mut self, path: &Path) {
        self.opts.source_files.push(path.to_path_buf());
        let parent = fs_utils::parent_dir(path);
        if !parent.as_os_str().is_empty() {
            self.opts.add_include_path(&parent);
        }
    }

    fn setup_cache(&mut self) {
        if self.opts.cache_dir.as_os_str().is_empty() {
            self.opts.cache_dir = fs_utils::preferred_path(
                &self.opts.full_compile_dir.join(CACHE_DIR),
            );
        }
        if self.opts.cache_allowed {
            if !fs_utils::mkdirs(&self.opts.cache_dir) {
                self.report(
                    ErrorKind::CmdCannotCreateCacheDir,
                    &self.opts.cache_dir.to_string_lossy(),
                );
            }
        } else {
            fs_utils::rm_recursive(&self.opts.cache_dir);
        }
    }

    /// The validation pass: source and library files must exist (errors);
    /// include and library paths should (warnings).
    fn check_command_line(&self) {
        for file in &self.opts.source_files {
            if !fs_utils::exists(file) {
                self.report(ErrorKind::CmdSourceFileDoesNotExist, &file.to_string_lossy());
            }
        }
        for file in &self.opts.library_files {
            if !fs_utils::exists(file) {
                self.report(
                    ErrorKind::CmdLibraryFileDoesNotExist,
                    &file.to_string_lossy(),
                );
            }
        }
        for path in &self.opts.library_paths {
            if !fs_utils::exists(path) {
                self.report(
                    ErrorKind::CmdLibraryPathDoesNotExist,
                    &path.to_string_lossy(),
                );
            }
        }
        for path in &self.opts.include_paths {
            if !fs_utils::exists(path) {
                self.report(
                    ErrorKind::CmdIncludePathDoesNotExist,
                    &path.to_string_lossy(),
                );
            }
        }
    }
}
