//! The Sylva driver library.
//!
//! [`execute_compilation`] runs one full invocation (normalize, per-file
//! preprocess and parse through the cache, log, return code); the batch
//! driver iterates a script of per-test command lines over it.

#![warn(missing_docs)]

pub mod batch;
pub mod compile;

pub use batch::run_batch;
pub use compile::execute_compilation;

/// The build identifier echoed in logs and `--version` output.
pub fn build_identifier() -> String {
    format!("VERSION: {}", env!("CARGO_PKG_VERSION"))
}
