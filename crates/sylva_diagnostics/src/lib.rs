//! Diagnostics for the Sylva frontend.
//!
//! A closed set of diagnostic kinds with severities and stable code strings,
//! symbol-based source locations, a thread-safe accumulating sink with
//! per-severity statistics, and the plain-text log-file writer.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod kind;
pub mod log_file;
pub mod sink;

pub use diagnostic::{Diagnostic, Location};
pub use kind::{ErrorKind, Severity};
pub use log_file::LogFile;
pub use sink::{DiagnosticSink, Stats};
