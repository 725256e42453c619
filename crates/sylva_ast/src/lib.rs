//! In-memory intermediate representation for the Sylva frontend.
//!
//! A [`FileContent`] owns the parse-tree nodes of one source file in a
//! dense [`NodeArena`] addressed by [`NodeId`] — never by reference —
//! together with the design elements found in the file. Cross-file
//! references travel through interned symbols only; the [`Design`] registry
//! ties file contents together without back pointers.

#![warn(missing_docs)]

pub mod design;
pub mod element;
pub mod file_content;
pub mod include_info;
pub mod line_translation;
pub mod macro_def;
pub mod node;
pub mod pp_data;
pub mod time_info;

pub use design::{Design, DEFAULT_LIBRARY};
pub use element::{DesignElement, ElementKind};
pub use file_content::FileContent;
pub use include_info::{push_pop_balanced, IncludeAction, IncludeContext, IncludeFileInfo};
pub use line_translation::LineTranslation;
pub use macro_def::{MacroDef, MacroKind, MacroStorage};
pub use node::{NodeArena, NodeId, VObject};
pub use pp_data::PpFileData;
pub use time_info::{TimeInfo, TimeScope, TimeUnit};
