//! Command-line normalization for the Sylva frontend.
//!
//! The surface is the Verilog argument grammar: plus-arguments
//! (`+incdir+`, `+define+`, `+libext+`), `-f` argument files with comment
//! stripping and environment-variable expansion, and an enumerated switch
//! table. Normalization happens before any compilation stage and resolves
//! the output, cache and precompiled directories.

#![warn(missing_docs)]

pub mod env;
pub mod normalize;
pub mod options;

pub use env::EnvMap;
pub use normalize::normalize;
pub use options::CommandOptions;
