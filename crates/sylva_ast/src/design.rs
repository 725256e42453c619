//! The design registry: all file contents of one invocation.

use std::collections::HashMap;
use std::sync::Mutex;

use sylva_common::Symbol;

use crate::file_content::FileContent;

/// Name of the default working library.
pub const DEFAULT_LIBRARY: &str = "work";

/// Shared registry of per-file contents, keyed by file symbol.
///
/// Preprocess and parse contents are kept in separate maps because a file
/// content is owned by at most one stage at a time. Both maps are
/// mutex-guarded and touched only at stage boundaries; workers never hold a
/// lock across file work.
#[derive(Default)]
pub struct Design {
    pp_contents: Mutex<HashMap<Symbol, FileContent>>,
    parse_contents: Mutex<HashMap<Symbol, FileContent>>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the preprocess-stage content for a file.
    pub fn add_pp_content(&self, file: Symbol, content: FileContent) {
        self.pp_contents.lock().unwrap().insert(file, content);
    }

    /// Registers (or replaces) the parse-stage content for a file.
    pub fn add_parse_content(&self, file: Symbol, content: FileContent) {
        self.parse_contents.lock().unwrap().insert(file, content);
    }

    /// Runs `f` with the preprocess-stage content for `file`, if present.
    pub fn with_pp_content<R>(&self, file: Symbol, f: impl FnOnce(&FileContent) -> R) -> Option<R> {
        self.pp_contents.lock().unwrap().get(&file).map(f)
    }

    /// Runs `f` with the parse-stage content for `file`, if present.
    pub fn with_parse_content<R>(
        &self,
        file: Symbol,
        f: impl FnOnce(&FileContent) -> R,
    ) -> Option<R> {
        self.parse_contents.lock().unwrap().get(&file).map(f)
    }

    /// Whether a preprocess-stage content exists for `file`.
    pub fn has_pp_content(&self, file: Symbol) -> bool {
        self.pp_contents.lock().unwrap().contains_key(&file)
    }

    /// Number of parse-stage contents registered.
    pub fn parse_content_count(&self) -> usize {
        self.parse_contents.lock().unwrap().len()
    }

    /// Collects the qualified names of every design element across all
    /// parse-stage contents, sorted.
    pub fn element_names(&self, interner: &sylva_common::Interner) -> Vec<String> {
        let contents = self.parse_contents.lock().unwrap();
        let mut names: Vec<String> = contents
            .values()
            .flat_map(|fc| {
                fc.design_elements()
                    .iter()
                    .map(|e| fc.qualify(interner, e.name))
            })
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{DesignElement, ElementKind};
    use crate::node::NodeId;
    use sylva_common::Interner;

    #[test]
    fn stage_maps_are_independent() {
        let interner = Interner::new();
        let design = Design::new();
        let file = interner.register("top.sv");
        let lib = interner.register(DEFAULT_LIBRARY);

        design.add_pp_content(file, FileContent::new(file, lib));
        assert!(design.has_pp_content(file));
        assert_eq!(design.parse_content_count(), 0);

        design.add_parse_content(file, FileContent::new(file, lib));
        assert_eq!(design.parse_content_count(), 1);
    }

    #[test]
    fn element_names_are_sorted_and_qualified() {
        let interner = Interner::new();
        let design = Design::new();
        let lib = interner.register(DEFAULT_LIBRARY);

        for (path, module) in [("b.sv", "zeta"), ("a.sv", "alpha")] {
            let file = interner.register(path);
            let mut fc = FileContent::new(file, lib);
            let name = interner.register(module);
            let elem = DesignElement::new(name, file, ElementKind::Module, NodeId::INVALID);
            let key = fc.qualify(&interner, name);
            fc.add_design_element(&key, elem);
            design.add_parse_content(file, fc);
        }

        assert_eq!(
            design.element_names(&interner),
            vec!["work@alpha".to_string(), "work@zeta".to_string()]
        );
    }
}
