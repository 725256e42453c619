//! Diagnostic messages and their symbol-based source locations.

use serde::{Deserialize, Serialize};
use sylva_common::{Interner, Symbol};

use crate::kind::{ErrorKind, Severity};

/// A source location expressed in interned symbols.
///
/// `file` and `object` are handles into the canonical symbol table; either
/// may be [`Symbol::BAD`] when the diagnostic has no precise anchor (for
/// example the invocation-wide cache-capacity warning).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Location {
    /// The file the diagnostic points into.
    pub file: Symbol,
    /// 1-based line, 0 if unknown.
    pub line: u32,
    /// 1-based column, 0 if unknown.
    pub column: u16,
    /// The symbol the diagnostic is about (a path, a name, an argument).
    pub object: Symbol,
}

impl Location {
    /// A location carrying only an object symbol.
    pub fn object(object: Symbol) -> Self {
        Self {
            file: Symbol::BAD,
            line: 0,
            column: 0,
            object,
        }
    }

    /// A location with file, line and column but no object.
    pub fn in_file(file: Symbol, line: u32, column: u16) -> Self {
        Self {
            file,
            line,
            column,
            object: Symbol::BAD,
        }
    }

    /// A location with no information at all.
    pub fn none() -> Self {
        Self::object(Symbol::BAD)
    }
}

/// A single diagnostic: a kind plus a location.
///
/// Severity and code string are derived from the kind; diagnostics are
/// deduplicated by `(kind, location)` when merged into a sink.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where.
    pub loc: Location,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(kind: ErrorKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    /// The severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Renders the diagnostic as a log-file line.
    pub fn render(&self, interner: &Interner) -> String {
        let mut out = format!("[{:>7}] ", self.severity().to_string());
        if !self.loc.file.is_bad() {
            out.push_str(interner.symbol(self.loc.file));
            if self.loc.line > 0 {
                out.push_str(&format!(":{}", self.loc.line));
                if self.loc.column > 0 {
                    out.push_str(&format!(":{}", self.loc.column));
                }
            }
            out.push_str(": ");
        }
        out.push_str(self.kind.code());
        if !self.loc.object.is_bad() {
            out.push_str(" (");
            out.push_str(interner.symbol(self.loc.object));
            out.push(')');
        }
        out
    }
}
