//! Design elements: named top-level constructs located in a file content.

use serde::{Deserialize, Serialize};
use sylva_common::Symbol;

use crate::node::NodeId;
use crate::time_info::TimeInfo;

/// The kind of a design element.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ElementKind {
    /// `module ... endmodule`
    Module,
    /// `package ... endpackage`
    Package,
    /// `program ... endprogram`
    Program,
    /// `class ... endclass`
    Class,
    /// `interface ... endinterface`
    Interface,
    /// `primitive ... endprimitive`
    Primitive,
    /// `config ... endconfig`
    Config,
    /// `checker ... endchecker`
    Checker,
    /// Anything else the scanner recognizes as a named region.
    Other,
}

impl ElementKind {
    /// The small integer code stored in cache files.
    pub fn as_code(self) -> u16 {
        match self {
            ElementKind::Module => 0,
            ElementKind::Package => 1,
            ElementKind::Program => 2,
            ElementKind::Class => 3,
            ElementKind::Interface => 4,
            ElementKind::Primitive => 5,
            ElementKind::Config => 6,
            ElementKind::Checker => 7,
            ElementKind::Other => 8,
        }
    }

    /// Decodes a cache code.
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => ElementKind::Module,
            1 => ElementKind::Package,
            2 => ElementKind::Program,
            3 => ElementKind::Class,
            4 => ElementKind::Interface,
            5 => ElementKind::Primitive,
            6 => ElementKind::Config,
            7 => ElementKind::Checker,
            8 => ElementKind::Other,
            _ => return None,
        })
    }

    /// The opening keyword of this element kind, or `None` for `Other`.
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            ElementKind::Module => "module",
            ElementKind::Package => "package",
            ElementKind::Program => "program",
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Primitive => "primitive",
            ElementKind::Config => "config",
            ElementKind::Checker => "checker",
            ElementKind::Other => return None,
        })
    }
}

/// A named, spanned region within a file content.
///
/// All node references are IDs into the owning file content's arena and must
/// be in range for that arena; names and files are canonical symbols.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesignElement {
    /// The element's name.
    pub name: Symbol,
    /// The file it was declared in.
    pub file: Symbol,
    /// What kind of element this is.
    pub kind: ElementKind,
    /// Unique id assigned by the compilation unit.
    pub unique_id: NodeId,
    /// 1-based start line.
    pub line: u32,
    /// 1-based start column.
    pub column: u16,
    /// 1-based end line.
    pub end_line: u32,
    /// 1-based end column.
    pub end_column: u16,
    /// Enclosing element's node, or invalid for top level.
    pub parent: NodeId,
    /// The element's root parse-tree node.
    pub node: NodeId,
    /// Opaque default-net-type code in effect at the element.
    pub default_net_type: u16,
    /// Time scale in effect at the element.
    pub time_info: TimeInfo,
}

impl DesignElement {
    /// Creates an element with an invalid node and default time info;
    /// the producing stage fills those in as it goes.
    pub fn new(name: Symbol, file: Symbol, kind: ElementKind, unique_id: NodeId) -> Self {
        Self {
            name,
            file,
            kind,
            unique_id,
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
            parent: NodeId::INVALID,
            node: NodeId::INVALID,
            default_net_type: 0,
            time_info: TimeInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_roundtrip() {
        for code in 0..=8u16 {
            let kind = ElementKind::from_code(code).unwrap();
            assert_eq!(kind.as_code(), code);
        }
        assert!(ElementKind::from_code(9).is_none());
    }

    #[test]
    fn keywords() {
        assert_eq!(ElementKind::Module.keyword(), Some("module"));
        assert_eq!(ElementKind::Checker.keyword(), Some("checker"));
        assert_eq!(ElementKind::Other.keyword(), None);
    }

    #[test]
    fn new_element_starts_unanchored() {
        let elem = DesignElement::new(
            Symbol::from_raw(1),
            Symbol::from_raw(2),
            ElementKind::Module,
            NodeId::from_raw(1),
        );
        assert!(elem.node.is_invalid());
        assert!(elem.parent.is_invalid());
        assert_eq!(elem.kind, ElementKind::Module);
    }
}
