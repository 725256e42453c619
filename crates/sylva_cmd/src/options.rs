//! The normalized invocation options.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use sylva_cache::CachePolicy;
use sylva_source::fs_utils;

/// Directory name for per-file compilation units.
pub const UNIT_DIR: &str = "slpp_unit";

/// Directory name for whole-project compilation.
pub const ALL_DIR: &str = "slpp_all";

/// Directory name for the cache under the compile directory.
pub const CACHE_DIR: &str = "cache";

/// Directory name of the precompiled package root.
pub const PRECOMPILED_DIR: &str = "pkg";

/// Everything the command line resolved to.
///
/// Produced once by [`normalize`](crate::normalize) before any compilation
/// stage; read-only afterwards.
#[derive(Debug)]
pub struct CommandOptions {
    /// `--help` was requested; short-circuit with code 0.
    pub help: bool,
    /// `--version` was requested; short-circuit with code 0.
    pub version: bool,

    /// Source files, in command-line order.
    pub source_files: Vec<PathBuf>,
    /// `-v` library files.
    pub library_files: Vec<PathBuf>,
    /// `-y` library paths.
    pub library_paths: Vec<PathBuf>,
    /// Include paths, canonical, deduplicated, in first-seen order.
    pub include_paths: Vec<PathBuf>,
    /// Library extensions (default `[".v"]`, replaced by `+libext+`).
    pub library_extensions: Vec<String>,
    /// `-D`/`+define+` macro definitions.
    pub defines: BTreeMap<String, String>,
    /// `-P`/`-pvalue+` parameter overrides.
    pub params: BTreeMap<String, String>,
    /// `-top` modules.
    pub top_modules: Vec<String>,
    /// `-L` ordered libraries.
    pub ordered_libraries: Vec<String>,
    /// `-map` library mapping files.
    pub map_files: Vec<PathBuf>,
    /// `-cfgfile` configuration files.
    pub config_files: Vec<PathBuf>,
    /// `-cfg` configurations to use.
    pub use_configs: Vec<String>,
    /// Files forced to SystemVerilog by `-sv <file>` (by basename).
    pub sv_files: HashSet<String>,
    /// All files forced to SystemVerilog (`-sverilog`, bare `-sv`).
    pub sverilog: bool,

    /// Output directory (default `.`).
    pub output_dir: PathBuf,
    /// Per-file compilation-unit mode (`-fileunit`).
    pub file_unit: bool,
    /// `<output_dir>/<slpp_unit|slpp_all>`, created during normalization.
    pub full_compile_dir: PathBuf,
    /// Resolved log file path.
    pub log_file: PathBuf,
    /// Resolved cache directory.
    pub cache_dir: PathBuf,
    /// Resolved precompiled package root.
    pub precompiled_dir: PathBuf,

    /// Caching enabled (`-nocache`/`-init` clear this).
    pub cache_allowed: bool,
    /// Skip cache hashing and integrity checks (`-nohash`).
    pub no_cache_hash: bool,
    /// Produce precompiled package caches (`-createcache`).
    pub create_cache: bool,

    /// Stage flags; see the stage-selection table.
    pub parse: bool,
    /// Compile stage enabled.
    pub compile: bool,
    /// Elaboration stage enabled.
    pub elaborate: bool,
    /// Write preprocessor output.
    pub write_pp: bool,
    /// `-parseonly`.
    pub parse_only: bool,
    /// `-sepcomp`.
    pub sep_comp: bool,
    /// `-link`.
    pub link: bool,
    /// `-lowmem`.
    pub low_mem: bool,
    /// `-elabuhdm` forces full elaboration.
    pub elab_uhdm: bool,

    /// Max worker threads (0 or 1 = single-threaded).
    pub max_threads: u32,
    /// Max worker processes (coerced to threads on Windows).
    pub max_processes: u32,

    /// `-timescale=` value.
    pub timescale: Option<String>,
    /// `-d <level>` numeric debug level.
    pub debug_level: u8,
    /// `-verbose`.
    pub verbose: bool,
    /// `-nostdout`.
    pub mute_stdout: bool,
    /// NOTE messages enabled.
    pub note: bool,
    /// INFO messages enabled.
    pub info: bool,
    /// WARNING messages enabled.
    pub warning: bool,
    /// `-split` threshold.
    pub split_lines: u32,
    /// `-exe` post command.
    pub exe_command: Option<String>,
    /// `-builtin` alternative package path.
    pub builtin_path: Option<PathBuf>,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            help: false,
            version: false,
            source_files: Vec::new(),
            library_files: Vec::new(),
            library_paths: Vec::new(),
            include_paths: Vec::new(),
            library_extensions: vec![".v".to_string()],
            defines: BTreeMap::new(),
            params: BTreeMap::new(),
            top_modules: Vec::new(),
            ordered_libraries: Vec::new(),
            map_files: Vec::new(),
            config_files: Vec::new(),
            use_configs: Vec::new(),
            sv_files: HashSet::new(),
            sverilog: false,
            output_dir: PathBuf::from("."),
            file_unit: false,
            full_compile_dir: PathBuf::new(),
            log_file: PathBuf::new(),
            cache_dir: PathBuf::new(),
            precompiled_dir: PathBuf::new(),
            cache_allowed: true,
            no_cache_hash: false,
            create_cache: false,
            parse: false,
            compile: false,
            elaborate: false,
            write_pp: false,
            parse_only: false,
            sep_comp: false,
            link: false,
            low_mem: false,
            elab_uhdm: false,
            max_threads: 0,
            max_processes: 0,
            timescale: None,
            debug_level: 0,
            verbose: false,
            mute_stdout: false,
            note: true,
            info: true,
            warning: true,
            split_lines: 10_000_000,
            exe_command: None,
            builtin_path: None,
        }
    }
}

impl CommandOptions {
    /// The compilation-unit directory name for this invocation.
    pub fn unit_dir_name(&self) -> &'static str {
        if self.file_unit {
            UNIT_DIR
        } else {
            ALL_DIR
        }
    }

    /// `NAME=value` define strings, sorted (the form the cache validator
    /// compares).
    pub fn define_strings(&self) -> Vec<String> {
        // BTreeMap iteration is already name-sorted.
        self.defines
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    }

    /// Builds the cache policy this invocation hands to the cache
    /// subsystem.
    pub fn cache_policy(&self, library: &str) -> CachePolicy {
        let mut policy = CachePolicy::new(
            self.cache_dir.clone(),
            self.precompiled_dir.clone(),
            library,
        );
        policy.no_hash = self.no_cache_hash;
        policy.parse_only = self.parse_only;
        policy.low_mem = self.low_mem;
        policy.create_cache = self.create_cache;
        policy.include_paths = self
            .include_paths
            .iter()
            .map(|p| fs_utils::preferred_path(p).to_string_lossy().into_owned())
            .collect();
        policy.defines = self.define_strings();
        policy.set_allowed(self.cache_allowed);
        policy
    }

    /// Registers an include path if its canonical form is new.
    pub fn add_include_path(&mut self, path: &Path) {
        let canon = fs_utils::preferred_path(path);
        if !self.include_paths.contains(&canon) {
            self.include_paths.push(canon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_contract() {
        let opts = CommandOptions::default();
        assert!(opts.cache_allowed);
        assert!(!opts.parse);
        assert_eq!(opts.library_extensions, vec![".v"]);
        assert_eq!(opts.unit_dir_name(), ALL_DIR);
        assert!(opts.note && opts.info && opts.warning);
    }

    #[test]
    fn file_unit_switches_directory() {
        let mut opts = CommandOptions::default();
        opts.file_unit = true;
        assert_eq!(opts.unit_dir_name(), UNIT_DIR);
    }

    #[test]
    fn define_strings_are_sorted() {
        let mut opts = CommandOptions::default();
        opts.defines.insert("Z".to_string(), "1".to_string());
        opts.defines.insert("A".to_string(), "2".to_string());
        opts.defines.insert("M".to_string(), String::new());
        assert_eq!(opts.define_strings(), vec!["A=2", "M=", "Z=1"]);
    }

    #[test]
    fn include_paths_deduplicate_by_canonical_form() {
        let mut opts = CommandOptions::default();
        opts.add_include_path(Path::new("/proj/rtl"));
        opts.add_include_path(Path::new("/proj/./rtl"));
        opts.add_include_path(Path::new("/proj/tb"));
        assert_eq!(opts.include_paths.len(), 2);
    }

    #[test]
    fn cache_policy_carries_the_validator_inputs() {
        let mut opts = CommandOptions::default();
        opts.cache_dir = PathBuf::from("/out/slpp_all/cache");
        opts.precompiled_dir = PathBuf::from("/opt/pkg");
        opts.defines.insert("W".to_string(), "8".to_string());
        opts.add_include_path(Path::new("/proj/rtl"));
        opts.no_cache_hash = true;

        let policy = opts.cache_policy("work");
        assert!(policy.allowed());
        assert!(policy.no_hash);
        assert_eq!(policy.defines, vec!["W=8"]);
        assert_eq!(policy.include_paths, vec!["/proj/rtl"]);

        opts.cache_allowed = false;
        assert!(!opts.cache_policy("work").allowed());
    }
}
