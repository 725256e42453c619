//! The per-file bundle of parse-tree nodes and design elements.

use std::collections::HashMap;

use sylva_common::{Interner, Symbol};

use crate::element::DesignElement;
use crate::node::{NodeArena, NodeId, VObject};

/// Everything one source file owns after a compilation stage.
///
/// Nodes live in a [`NodeArena`] addressed by [`NodeId`]; design elements
/// reference nodes by ID only. A file content holds no pointer back to its
/// design — lookups go through the [`Design`](crate::design::Design)
/// registry keyed on the file symbol.
#[derive(Debug)]
pub struct FileContent {
    /// The file this content belongs to (interned path).
    pub file: Symbol,
    /// The owning library's name symbol.
    pub library: Symbol,
    nodes: NodeArena,
    elements: Vec<DesignElement>,
    element_index: HashMap<String, usize>,
}

impl FileContent {
    /// Creates an empty file content.
    pub fn new(file: Symbol, library: Symbol) -> Self {
        Self {
            file,
            library,
            nodes: NodeArena::new(),
            elements: Vec::new(),
            element_index: HashMap::new(),
        }
    }

    /// Allocates a node and returns its ID (never [`NodeId::INVALID`]).
    pub fn add_node(&mut self, obj: VObject) -> NodeId {
        self.nodes.alloc(obj)
    }

    /// Returns the node with the given ID, or `None` for the invalid node
    /// and out-of-range IDs.
    pub fn node(&self, id: NodeId) -> Option<&VObject> {
        self.nodes.get(id)
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut VObject> {
        self.nodes.get_mut(id)
    }

    /// The number of node slots, counting the reserved sentinel. This is
    /// the count the cache capacity check is applied to.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates the live nodes in ID (serialization) order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &VObject)> {
        self.nodes.live()
    }

    /// Adds a design element under its qualified `<library>@<name>` key.
    pub fn add_design_element(&mut self, qualified_name: &str, elem: DesignElement) {
        self.element_index
            .insert(qualified_name.to_string(), self.elements.len());
        self.elements.push(elem);
    }

    /// The design elements in declaration order.
    pub fn design_elements(&self) -> &[DesignElement] {
        &self.elements
    }

    /// Looks up a design element by qualified `<library>@<name>` key.
    pub fn design_element(&self, qualified_name: &str) -> Option<&DesignElement> {
        self.element_index
            .get(qualified_name)
            .map(|&i| &self.elements[i])
    }

    /// Builds the qualified key for a name in this content's library.
    pub fn qualify(&self, interner: &Interner, name: Symbol) -> String {
        format!("{}@{}", interner.symbol(self.library), interner.symbol(name))
    }

    /// Checks the arena invariant: every node ID referenced by a design
    /// element is in range for this content's node array.
    pub fn elements_in_range(&self) -> bool {
        self.elements
            .iter()
            .all(|e| self.nodes.in_range(e.node) && self.nodes.in_range(e.parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn content() -> FileContent {
        FileContent::new(Symbol::from_raw(1), Symbol::from_raw(2))
    }

    #[test]
    fn slot_zero_is_reserved() {
        let mut fc = content();
        assert_eq!(fc.node_count(), 1);
        let id = fc.add_node(VObject::invalid());
        assert_eq!(id.as_raw(), 1);
        assert!(fc.node(NodeId::INVALID).is_none());
    }

    #[test]
    fn add_and_lookup_element() {
        let interner = Interner::new();
        let lib = interner.register("work");
        let name = interner.register("m");
        let mut fc = FileContent::new(interner.register("top.sv"), lib);
        let node = fc.add_node(VObject::invalid());
        let mut elem = DesignElement::new(name, fc.file, ElementKind::Module, node);
        elem.node = node;
        let key = fc.qualify(&interner, name);
        fc.add_design_element(&key, elem);

        assert_eq!(key, "work@m");
        assert_eq!(fc.design_elements().len(), 1);
        assert_eq!(fc.design_element("work@m").unwrap().kind, ElementKind::Module);
        assert!(fc.design_element("work@other").is_none());
    }

    #[test]
    fn elements_in_range_detects_stray_ids() {
        let mut fc = content();
        let node = fc.add_node(VObject::invalid());
        let mut elem = DesignElement::new(Symbol::BAD, fc.file, ElementKind::Module, node);
        elem.node = node;
        fc.add_design_element("work@ok", elem);
        assert!(fc.elements_in_range());

        let mut bad = DesignElement::new(Symbol::BAD, fc.file, ElementKind::Module, node);
        bad.node = NodeId::from_raw(999);
        fc.add_design_element("work@bad", bad);
        assert!(!fc.elements_in_range());
    }

    #[test]
    fn unanchored_elements_pass_the_range_check() {
        // Elements with invalid node/parent (not yet anchored) reference
        // the reserved slot, which is always in range.
        let mut fc = content();
        let elem = DesignElement::new(Symbol::BAD, fc.file, ElementKind::Package, NodeId::INVALID);
        fc.add_design_element("work@p", elem);
        assert!(fc.elements_in_range());
    }
}
