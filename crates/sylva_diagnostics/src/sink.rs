//! Thread-safe diagnostic accumulator for parallel compilation stages.

use std::collections::HashSet;
use std::ops::AddAssign;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::kind::Severity;

/// Per-severity diagnostic counts.
///
/// The fatal, syntax and error counts drive bits 0, 1 and 2 of the process
/// return code. Batch mode accumulates one `Stats` per line with `+=`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Unrecoverable failures.
    pub nb_fatal: usize,
    /// Parser syntax errors.
    pub nb_syntax: usize,
    /// Plain errors.
    pub nb_error: usize,
    /// Warnings.
    pub nb_warning: usize,
    /// Informational messages.
    pub nb_info: usize,
    /// Notes.
    pub nb_note: usize,
}

impl Stats {
    /// The process return-code bitmask: bit 0 fatal, bit 1 syntax, bit 2 error.
    pub fn return_code(&self) -> u32 {
        let mut code = 0;
        if self.nb_fatal > 0 {
            code |= 0x1;
        }
        if self.nb_syntax > 0 {
            code |= 0x2;
        }
        if self.nb_error > 0 {
            code |= 0x4;
        }
        code
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        self.nb_fatal += rhs.nb_fatal;
        self.nb_syntax += rhs.nb_syntax;
        self.nb_error += rhs.nb_error;
        self.nb_warning += rhs.nb_warning;
        self.nb_info += rhs.nb_info;
        self.nb_note += rhs.nb_note;
    }
}

/// A thread-safe accumulator for diagnostics.
///
/// Workers emit directly or collect into per-worker vectors merged with
/// [`extend`](Self::extend) at stage barriers. Diagnostics are deduplicated
/// by `(kind, location)`. The fatal flag is the only cross-worker
/// cancellation signal: it is set on the first fatal diagnostic and checked
/// by workers at work-unit boundaries.
pub struct DiagnosticSink {
    diagnostics: Mutex<SinkInner>,
    fatal_seen: AtomicBool,
}

struct SinkInner {
    ordered: Vec<Diagnostic>,
    seen: HashSet<Diagnostic>,
}

impl DiagnosticSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(SinkInner {
                ordered: Vec::new(),
                seen: HashSet::new(),
            }),
            fatal_seen: AtomicBool::new(false),
        }
    }

    /// Emits one diagnostic. Duplicates (same kind and location) are dropped.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity() == Severity::Fatal {
            self.fatal_seen.store(true, Ordering::Release);
        }
        let mut inner = self.diagnostics.lock().unwrap();
        if inner.seen.insert(diag) {
            inner.ordered.push(diag);
        }
    }

    /// Merges a per-worker batch into the sink.
    pub fn extend(&self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.emit(diag);
        }
    }

    /// Returns `true` if a fatal diagnostic has been emitted.
    ///
    /// This is the cooperative cancellation flag: remaining queued work
    /// units should drain as no-ops once it is set.
    pub fn has_fatal(&self) -> bool {
        self.fatal_seen.load(Ordering::Acquire)
    }

    /// Snapshot of all accumulated diagnostics in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().unwrap().ordered.clone()
    }

    /// Current per-severity counts.
    pub fn stats(&self) -> Stats {
        let inner = self.diagnostics.lock().unwrap();
        let mut stats = Stats::default();
        for diag in &inner.ordered {
            match diag.severity() {
                Severity::Fatal => stats.nb_fatal += 1,
                Severity::Syntax => stats.nb_syntax += 1,
                Severity::Error => stats.nb_error += 1,
                Severity::Warning => stats.nb_warning += 1,
                Severity::Info => stats.nb_info += 1,
                Severity::Note => stats.nb_note += 1,
            }
        }
        stats
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
