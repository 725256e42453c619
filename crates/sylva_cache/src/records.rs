//! Serialized record layouts for the two cache kinds.
//!
//! Numeric fields are the `as_code` forms of the closed enumerations;
//! symbol-valued fields are handles into the record's own cache-local
//! string table (`symbols`). Strings that occur once (macro names, include
//! paths, section files) are stored inline, as the formats they mirror do.

use serde::{Deserialize, Serialize};
use sylva_ast::{
    DesignElement, ElementKind, IncludeAction, IncludeContext, IncludeFileInfo, LineTranslation,
    MacroDef, MacroKind, NodeId, TimeInfo, TimeScope, TimeUnit, VObject,
};
use sylva_common::Interner;
use sylva_diagnostics::{Diagnostic, ErrorKind, Location};

use crate::symbols::CacheSymbols;

/// One macro definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroRecord {
    /// Macro name, inline.
    pub name: String,
    /// [`MacroKind`] code.
    pub kind: u16,
    /// Start line of the definition.
    pub start_line: u32,
    /// Start column.
    pub start_column: u16,
    /// End line.
    pub end_line: u32,
    /// End column.
    pub end_column: u16,
    /// Formal argument names, in order.
    pub arguments: Vec<String>,
    /// Body tokens, in order; may contain empty strings.
    pub tokens: Vec<String>,
}

impl MacroRecord {
    /// Builds a record from a named definition.
    pub fn from_def(name: &str, def: &MacroDef) -> Self {
        Self {
            name: name.to_string(),
            kind: def.kind.as_code(),
            start_line: def.start_line,
            start_column: def.start_column,
            end_line: def.end_line,
            end_column: def.end_column,
            arguments: def.arguments.clone(),
            tokens: def.tokens.clone(),
        }
    }

    /// Rebuilds the named definition.
    pub fn to_def(&self) -> (String, MacroDef) {
        (
            self.name.clone(),
            MacroDef {
                kind: MacroKind::from_code(self.kind).unwrap_or(MacroKind::NoArgs),
                start_line: self.start_line,
                start_column: self.start_column,
                end_line: self.end_line,
                end_column: self.end_column,
                arguments: self.arguments.clone(),
                tokens: self.tokens.clone(),
            },
        )
    }
}

/// One recorded time scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeInfoRecord {
    /// [`TimeScope`] code.
    pub scope: u16,
    /// Cache-local symbol of the file.
    pub file: u32,
    /// Line of the directive.
    pub line: u32,
    /// [`TimeUnit`] code of the unit.
    pub unit: u16,
    /// Unit multiplier.
    pub unit_value: f64,
    /// [`TimeUnit`] code of the precision.
    pub precision: u16,
    /// Precision multiplier.
    pub precision_value: f64,
}

impl TimeInfoRecord {
    /// Encodes, re-interning the file symbol into the cache-local table.
    pub fn encode(info: &TimeInfo, interner: &Interner, syms: &mut CacheSymbols) -> Self {
        Self {
            scope: info.scope.as_code(),
            file: syms.register_symbol(interner, info.file),
            line: info.line,
            unit: info.unit.as_code(),
            unit_value: info.unit_value,
            precision: info.precision.as_code(),
            precision_value: info.precision_value,
        }
    }

    /// Decodes, re-interning the file string into the canonical table.
    pub fn decode(&self, interner: &Interner, syms: &CacheSymbols) -> TimeInfo {
        TimeInfo {
            scope: TimeScope::from_code(self.scope).unwrap_or(TimeScope::File),
            file: syms.to_canonical(interner, self.file),
            line: self.line,
            unit: TimeUnit::from_code(self.unit).unwrap_or(TimeUnit::Nanosecond),
            unit_value: self.unit_value,
            precision: TimeUnit::from_code(self.precision).unwrap_or(TimeUnit::Nanosecond),
            precision_value: self.precision_value,
        }
    }
}

/// One `` `line `` translation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTranslationRecord {
    /// The pretend file, inline.
    pub pretend_file: String,
    /// Line of the directive in real source.
    pub original_line: u32,
    /// Line to report from there on.
    pub pretend_line: u32,
}

impl LineTranslationRecord {
    /// Encodes one translation.
    pub fn encode(lt: &LineTranslation, interner: &Interner) -> Self {
        Self {
            pretend_file: interner.symbol(lt.pretend_file).to_string(),
            original_line: lt.original_line,
            pretend_line: lt.pretend_line,
        }
    }

    /// Decodes one translation.
    pub fn decode(&self, interner: &Interner) -> LineTranslation {
        LineTranslation {
            pretend_file: interner.register(&self.pretend_file),
            original_line: self.original_line,
            pretend_line: self.pretend_line,
        }
    }
}

/// One include-section boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeInfoRecord {
    /// [`IncludeContext`] code.
    pub context: u16,
    /// Output line the section starts at.
    pub section_start_line: u32,
    /// The section's file, inline.
    pub section_file: String,
    /// Original start line.
    pub original_start_line: u32,
    /// Original start column.
    pub original_start_column: u16,
    /// Original end line.
    pub original_end_line: u32,
    /// Original end column.
    pub original_end_column: u16,
    /// [`IncludeAction`] code.
    pub action: u16,
    /// Matching push index.
    pub index_opening: u32,
    /// Matching pop index.
    pub index_closing: u32,
}

impl IncludeInfoRecord {
    /// Encodes one boundary.
    pub fn encode(info: &IncludeFileInfo, interner: &Interner) -> Self {
        Self {
            context: info.context.as_code(),
            section_start_line: info.section_start_line,
            section_file: interner.symbol(info.section_file).to_string(),
            original_start_line: info.original_start_line,
            original_start_column: info.original_start_column,
            original_end_line: info.original_end_line,
            original_end_column: info.original_end_column,
            action: info.action.as_code(),
            index_opening: info.index_opening,
            index_closing: info.index_closing,
        }
    }

    /// Decodes one boundary.
    pub fn decode(&self, interner: &Interner) -> IncludeFileInfo {
        IncludeFileInfo {
            context: IncludeContext::from_code(self.context).unwrap_or(IncludeContext::Include),
            section_start_line: self.section_start_line,
            section_file: interner.register(&self.section_file),
            original_start_line: self.original_start_line,
            original_start_column: self.original_start_column,
            original_end_line: self.original_end_line,
            original_end_column: self.original_end_column,
            action: IncludeAction::from_code(self.action).unwrap_or(IncludeAction::Push),
            index_opening: self.index_opening,
            index_closing: self.index_closing,
        }
    }
}

/// One diagnostic scoped to the cached file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// [`ErrorKind`] code.
    pub kind: u16,
    /// Cache-local symbol of the file.
    pub file: u32,
    /// Line.
    pub line: u32,
    /// Column.
    pub column: u16,
    /// Cache-local symbol of the object.
    pub object: u32,
}

impl DiagnosticRecord {
    /// Encodes one diagnostic through the cache-local table.
    pub fn encode(diag: &Diagnostic, interner: &Interner, syms: &mut CacheSymbols) -> Self {
        Self {
            kind: diag.kind.as_code(),
            file: syms.register_symbol(interner, diag.loc.file),
            line: diag.loc.line,
            column: diag.loc.column,
            object: syms.register_symbol(interner, diag.loc.object),
        }
    }

    /// Decodes one diagnostic, dropping entries with unknown kind codes.
    pub fn decode(&self, interner: &Interner, syms: &CacheSymbols) -> Option<Diagnostic> {
        let kind = ErrorKind::from_code(self.kind)?;
        Some(Diagnostic::new(
            kind,
            Location {
                file: syms.to_canonical(interner, self.file),
                line: self.line,
                column: self.column,
                object: syms.to_canonical(interner, self.object),
            },
        ))
    }
}

/// One parse-tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Cache-local symbol of the node's name.
    pub name: u32,
    /// Opaque grammar code.
    pub kind: u16,
    /// Cache-local symbol of the node's file.
    pub file: u32,
    /// Start line.
    pub line: u32,
    /// Start column.
    pub column: u16,
    /// End line.
    pub end_line: u32,
    /// End column.
    pub end_column: u16,
    /// Parent node index.
    pub parent: u32,
    /// Definition node index.
    pub definition: u32,
    /// First child index.
    pub child: u32,
    /// Next sibling index.
    pub sibling: u32,
}

impl NodeRecord {
    /// Encodes one node; inter-node links keep their index values.
    pub fn encode(obj: &VObject, interner: &Interner, syms: &mut CacheSymbols) -> Self {
        Self {
            name: syms.register_symbol(interner, obj.name),
            kind: obj.kind,
            file: syms.register_symbol(interner, obj.file),
            line: obj.line,
            column: obj.column,
            end_line: obj.end_line,
            end_column: obj.end_column,
            parent: obj.parent.as_raw(),
            definition: obj.definition.as_raw(),
            child: obj.child.as_raw(),
            sibling: obj.sibling.as_raw(),
        }
    }

    /// Decodes one node.
    pub fn decode(&self, interner: &Interner, syms: &CacheSymbols) -> VObject {
        VObject {
            name: syms.to_canonical(interner, self.name),
            kind: self.kind,
            file: syms.to_canonical(interner, self.file),
            line: self.line,
            column: self.column,
            end_line: self.end_line,
            end_column: self.end_column,
            parent: NodeId::from_raw(self.parent),
            definition: NodeId::from_raw(self.definition),
            child: NodeId::from_raw(self.child),
            sibling: NodeId::from_raw(self.sibling),
        }
    }
}

/// One design element with its time info.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Cache-local symbol of the element name.
    pub name: u32,
    /// Cache-local symbol of the declaring file.
    pub file: u32,
    /// [`ElementKind`] code.
    pub kind: u16,
    /// Unit-unique element id.
    pub unique_id: u32,
    /// Start line.
    pub line: u32,
    /// Start column.
    pub column: u16,
    /// End line.
    pub end_line: u32,
    /// End column.
    pub end_column: u16,
    /// Parent node index.
    pub parent: u32,
    /// Root node index.
    pub node: u32,
    /// Opaque default-net-type code.
    pub default_net_type: u16,
    /// Element time scale.
    pub time_info: TimeInfoRecord,
}

impl ElementRecord {
    /// Encodes one element.
    pub fn encode(elem: &DesignElement, interner: &Interner, syms: &mut CacheSymbols) -> Self {
        Self {
            name: syms.register_symbol(interner, elem.name),
            file: syms.register_symbol(interner, elem.file),
            kind: elem.kind.as_code(),
            unique_id: elem.unique_id.as_raw(),
            line: elem.line,
            column: elem.column,
            end_line: elem.end_line,
            end_column: elem.end_column,
            parent: elem.parent.as_raw(),
            node: elem.node.as_raw(),
            default_net_type: elem.default_net_type,
            time_info: TimeInfoRecord::encode(&elem.time_info, interner, syms),
        }
    }

    /// Decodes one element.
    pub fn decode(&self, interner: &Interner, syms: &CacheSymbols) -> DesignElement {
        DesignElement {
            name: syms.to_canonical(interner, self.name),
            file: syms.to_canonical(interner, self.file),
            kind: ElementKind::from_code(self.kind).unwrap_or(ElementKind::Other),
            unique_id: NodeId::from_raw(self.unique_id),
            line: self.line,
            column: self.column,
            end_line: self.end_line,
            end_column: self.end_column,
            parent: NodeId::from_raw(self.parent),
            node: NodeId::from_raw(self.node),
            default_net_type: self.default_net_type,
            time_info: self.time_info.decode(interner, syms),
        }
    }
}

/// The serialized preprocess cache record.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PpCacheRecord {
    /// Macro definitions in name order.
    pub macros: Vec<MacroRecord>,
    /// Transitively included files, sorted.
    pub includes: Vec<String>,
    /// The preprocessed body text.
    pub body: String,
    /// Diagnostics scoped to this file.
    pub errors: Vec<DiagnosticRecord>,
    /// The cache-local symbol table, in handle order.
    pub symbols: Vec<String>,
    /// Command-line include paths at save time.
    pub cmd_include_paths: Vec<String>,
    /// Command-line defines (`NAME=value`, sorted) at save time.
    pub cmd_defines: Vec<String>,
    /// Time-scale directives recorded for this file.
    pub time_infos: Vec<TimeInfoRecord>,
    /// `` `line `` translations.
    pub line_translations: Vec<LineTranslationRecord>,
    /// Include-section boundaries, balanced push/pop.
    pub include_infos: Vec<IncludeInfoRecord>,
    /// Parse-tree nodes produced by the preprocessor (slot 0 excluded).
    pub objects: Vec<NodeRecord>,
}

/// The serialized parse cache record.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseCacheRecord {
    /// Diagnostics scoped to this file.
    pub errors: Vec<DiagnosticRecord>,
    /// The cache-local symbol table, in handle order.
    pub symbols: Vec<String>,
    /// Design elements with their time info.
    pub elements: Vec<ElementRecord>,
    /// Parse-tree nodes (slot 0 excluded).
    pub objects: Vec<NodeRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_common::Symbol;

    #[test]
    fn macro_record_roundtrip() {
        let def = MacroDef {
            kind: MacroKind::WithArgs,
            start_line: 3,
            start_column: 1,
            end_line: 3,
            end_column: 40,
            arguments: vec!["a".to_string(), "b".to_string()],
            tokens: vec!["(a)+(b)".to_string(), "".to_string()],
        };
        let rec = MacroRecord::from_def("SUM", &def);
        let (name, back) = rec.to_def();
        assert_eq!(name, "SUM");
        assert_eq!(back, def);
    }

    #[test]
    fn time_info_roundtrip_remaps_symbols() {
        let interner = Interner::new();
        let mut syms = CacheSymbols::new();
        let info = TimeInfo {
            scope: TimeScope::File,
            file: interner.register("top.sv"),
            line: 1,
            unit: TimeUnit::Nanosecond,
            unit_value: 1.0,
            precision: TimeUnit::Picosecond,
            precision_value: 10.0,
        };
        let rec = TimeInfoRecord::encode(&info, &interner, &mut syms);
        let back = rec.decode(&interner, &syms);
        assert_eq!(back, info);
    }

    #[test]
    fn diagnostic_with_unknown_kind_is_dropped() {
        let interner = Interner::new();
        let syms = CacheSymbols::new();
        let rec = DiagnosticRecord {
            kind: 9999,
            file: 0,
            line: 1,
            column: 1,
            object: 0,
        };
        assert!(rec.decode(&interner, &syms).is_none());
    }

    #[test]
    fn node_links_survive_roundtrip() {
        let interner = Interner::new();
        let mut syms = CacheSymbols::new();
        let mut obj = VObject::new(interner.register("m"), 5, interner.register("top.sv"), 2, 1);
        obj.parent = NodeId::from_raw(1);
        obj.child = NodeId::from_raw(3);
        let rec = NodeRecord::encode(&obj, &interner, &mut syms);
        let back = rec.decode(&interner, &syms);
        assert_eq!(back, obj);
    }

    #[test]
    fn element_record_roundtrip() {
        let interner = Interner::new();
        let mut syms = CacheSymbols::new();
        let mut elem = DesignElement::new(
            interner.register("m"),
            interner.register("top.sv"),
            ElementKind::Module,
            NodeId::from_raw(7),
        );
        elem.line = 2;
        elem.node = NodeId::from_raw(1);
        elem.default_net_type = 3;
        let rec = ElementRecord::encode(&elem, &interner, &mut syms);
        let back = rec.decode(&interner, &syms);
        assert_eq!(back, elem);
    }

    #[test]
    fn records_tolerate_bad_symbols() {
        let interner = Interner::new();
        let mut syms = CacheSymbols::new();
        let obj = VObject::new(Symbol::BAD, 0, Symbol::BAD, 0, 0);
        let rec = NodeRecord::encode(&obj, &interner, &mut syms);
        let back = rec.decode(&interner, &syms);
        assert_eq!(interner.symbol(back.name), "@@BAD_SYMBOL@@");
    }
}
