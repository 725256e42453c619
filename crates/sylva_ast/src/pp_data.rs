//! The data bundle a preprocessed file produces besides its node arena.

use std::path::PathBuf;

use crate::include_info::IncludeFileInfo;
use crate::line_translation::LineTranslation;
use crate::macro_def::MacroStorage;
use crate::time_info::TimeInfo;

/// Everything the preprocessor records for one file.
///
/// This is the payload the preprocess cache persists next to the file's
/// parse-tree nodes and diagnostics.
#[derive(Debug, Default)]
pub struct PpFileData {
    /// Macros defined while preprocessing this file, keyed by name.
    pub macros: MacroStorage,
    /// Transitively included files.
    pub includes: Vec<PathBuf>,
    /// The preprocessed body text.
    pub body: String,
    /// Time-scale directives recorded in this file.
    pub time_infos: Vec<TimeInfo>,
    /// `` `line `` translations.
    pub line_translations: Vec<LineTranslation>,
    /// Include-section boundaries (balanced push/pop).
    pub include_infos: Vec<IncludeFileInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let data = PpFileData::default();
        assert!(data.macros.is_empty());
        assert!(data.includes.is_empty());
        assert!(data.body.is_empty());
        assert!(data.include_infos.is_empty());
    }
}
