//! Include-section bookkeeping produced by the preprocessor.

use serde::{Deserialize, Serialize};
use sylva_common::Symbol;

/// Why a section boundary was produced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum IncludeContext {
    /// An `` `include `` directive.
    Include,
    /// A macro expansion that switches the apparent file.
    MacroExpansion,
}

impl IncludeContext {
    /// The small integer code stored in cache files.
    pub fn as_code(self) -> u16 {
        match self {
            IncludeContext::Include => 0,
            IncludeContext::MacroExpansion => 1,
        }
    }

    /// Decodes a cache code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(IncludeContext::Include),
            1 => Some(IncludeContext::MacroExpansion),
            _ => None,
        }
    }
}

/// Whether this entry opens or closes a section.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum IncludeAction {
    /// Section entry.
    Push,
    /// Section exit.
    Pop,
}

impl IncludeAction {
    /// The small integer code stored in cache files.
    pub fn as_code(self) -> u16 {
        match self {
            IncludeAction::Push => 1,
            IncludeAction::Pop => 2,
        }
    }

    /// Decodes a cache code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(IncludeAction::Push),
            2 => Some(IncludeAction::Pop),
            _ => None,
        }
    }
}

/// One section boundary in the preprocessor output.
///
/// `index_opening`/`index_closing` are indices into the owning vector of
/// infos: a `Push` at index *i* points forward to its `Pop` at index
/// *j > i*, and that `Pop` points back at *i*. Sections nest properly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeFileInfo {
    /// Why this boundary exists.
    pub context: IncludeContext,
    /// Line in the preprocessor output where the section starts.
    pub section_start_line: u32,
    /// The file the section's content comes from.
    pub section_file: Symbol,
    /// Start line in the original source.
    pub original_start_line: u32,
    /// Start column in the original source.
    pub original_start_column: u16,
    /// End line in the original source.
    pub original_end_line: u32,
    /// End column in the original source.
    pub original_end_column: u16,
    /// Push or pop.
    pub action: IncludeAction,
    /// Index of the matching (or own) push entry.
    pub index_opening: u32,
    /// Index of the matching (or own) pop entry.
    pub index_closing: u32,
}

/// Checks that push/pop entries bracket properly: every push is matched by
/// exactly one later pop, the pairs agree on each other's indices, and
/// regions nest.
pub fn push_pop_balanced(infos: &[IncludeFileInfo]) -> bool {
    let mut stack: Vec<usize> = Vec::new();
    for (i, info) in infos.iter().enumerate() {
        match info.action {
            IncludeAction::Push => stack.push(i),
            IncludeAction::Pop => {
                let Some(open) = stack.pop() else {
                    return false;
                };
                if infos[open].index_closing != i as u32 || info.index_opening != open as u32 {
                    return false;
                }
            }
        }
    }
    stack.is_empty()
}
