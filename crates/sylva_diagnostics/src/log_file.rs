//! Plain-text log-file output.
//!
//! The log file is part of the frontend's external interface: UTF-8 text at
//! `<output-dir>/<unit-or-all>/sylva.log` unless overridden with `-l`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use sylva_common::Interner;

use crate::diagnostic::Diagnostic;
use crate::sink::Stats;

/// Default log file name under the compile directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "sylva.log";

const BANNER: &[&str] = &[
    "*****************************************",
    "*  SYLVA  SystemVerilog compiler front  *",
    "*****************************************",
];

const FOOTER: &[&str] = &[
    "*****************************************",
    "*        End SYLVA compiler front       *",
    "*****************************************",
];

/// Writer for the invocation log file.
///
/// Appends in three phases: header (banner, build id, command echo),
/// diagnostics, footer (stats). Failures to write are swallowed; logging
/// never aborts a compilation.
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    /// Creates a writer targeting `path`. The file is truncated on the
    /// first write of this invocation.
    pub fn new(path: &Path) -> Self {
        let _ = std::fs::remove_file(path);
        Self {
            path: path.to_path_buf(),
        }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, text: &str) {
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = f.write_all(text.as_bytes());
        }
    }

    /// Writes the banner, build identifier and echoed command line.
    pub fn write_header(&self, build_id: &str, command: &[String]) {
        let mut out = String::new();
        for line in BANNER {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(build_id);
        out.push('\n');
        out.push_str("COMMAND:");
        for arg in command {
            out.push(' ');
            out.push_str(arg);
        }
        out.push_str("\n\n");
        self.append(&out);
    }

    /// Writes one line per diagnostic.
    pub fn write_diagnostics(&self, diags: &[Diagnostic], interner: &Interner) {
        let mut out = String::new();
        for diag in diags {
            out.push_str(&diag.render(interner));
            out.push('\n');
        }
        self.append(&out);
    }

    /// Writes the stats summary and the closing banner.
    pub fn write_footer(&self, stats: &Stats) {
        let mut out = format!(
            "\nFATAL: {} SYNTAX: {} ERROR: {} WARNING: {} INFO: {} NOTE: {}\n\n",
            stats.nb_fatal,
            stats.nb_syntax,
            stats.nb_error,
            stats.nb_warning,
            stats.nb_info,
            stats.nb_note
        );
        for line in FOOTER {
            out.push_str(line);
            out.push('\n');
        }
        self.append(&out);
    }
}
