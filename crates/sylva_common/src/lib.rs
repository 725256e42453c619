//! Shared foundational types used across the Sylva SystemVerilog frontend.
//!
//! This crate provides the canonical string interner and its [`Symbol`]
//! handles, the path fingerprint used by the cache directory layout, and
//! common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod symbol;

pub use hash::ContentHash;
pub use result::{InternalError, SylvaResult};
pub use symbol::{Interner, Symbol};
