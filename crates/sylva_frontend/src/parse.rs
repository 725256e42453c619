//! The structural parser.
//!
//! Scans the preprocessed body for design-element regions (`module` ...
//! `endmodule`, `package` ... `endpackage`, and the rest of the closed
//! element-kind set), producing a [`DesignElement`] per region and
//! parse-tree nodes with parent/child/sibling links. This is deliberately
//! not a grammar: the frontend's cache and orchestration are specified
//! against an opaque node sequence, and this scanner is the producer.

use std::path::Path;

use sylva_ast::{DesignElement, ElementKind, FileContent, NodeId, VObject};
use sylva_common::{Interner, Symbol};
use sylva_diagnostics::{Diagnostic, ErrorKind, Location};

use crate::node_kind;
use crate::unit::CompilationUnit;

/// The parse stage's result for one file.
#[derive(Debug)]
pub struct ParseOutput {
    /// Nodes and design elements.
    pub content: FileContent,
    /// Diagnostics scoped to this file.
    pub diagnostics: Vec<Diagnostic>,
}

const OPENERS: &[(&str, ElementKind)] = &[
    ("module", ElementKind::Module),
    ("package", ElementKind::Package),
    ("program", ElementKind::Program),
    ("class", ElementKind::Class),
    ("interface", ElementKind::Interface),
    ("primitive", ElementKind::Primitive),
    ("config", ElementKind::Config),
    ("checker", ElementKind::Checker),
];

fn opener(word: &str) -> Option<ElementKind> {
    OPENERS.iter().find(|(kw, _)| *kw == word).map(|(_, k)| *k)
}

fn closer(word: &str) -> Option<ElementKind> {
    let kw = word.strip_prefix("end")?;
    opener(kw)
}

struct OpenRegion {
    kind: ElementKind,
    elem_index: usize,
    node: NodeId,
    last_child: NodeId,
}

/// Parses the preprocessed `body` of `source`.
pub fn parse_source(
    interner: &Interner,
    unit: &CompilationUnit,
    source: &Path,
    body: &str,
    library: Symbol,
) -> ParseOutput {
    let file_sym = interner.register(&source.to_string_lossy());
    let mut content = FileContent::new(file_sym, library);
    let root = content.add_node(VObject::new(file_sym, node_kind::PA_FILE, file_sym, 1, 1));
    let mut diagnostics = Vec::new();

    let mut elements: Vec<DesignElement> = Vec::new();
    let mut stack: Vec<OpenRegion> = Vec::new();
    let mut root_last_child = NodeId::INVALID;
    // The token that must be a name for the region just opened.
    let mut pending: Option<ElementKind> = None;
    let mut pending_pos = (0u32, 0u16);

    for (line_idx, line) in body.lines().enumerate() {
        let line_no = (line_idx + 1) as u32;
        for (word, col) in words(line) {
            if let Some(kind) = pending.take() {
                let (open_line, open_col) = pending_pos;
                let name_sym = interner.register(word);
                let parent_node = stack.last().map(|r| r.node).unwrap_or(NodeId::INVALID);

                let node = content.add_node(VObject {
                    parent: if parent_node.is_invalid() { root } else { parent_node },
                    ..VObject::new(name_sym, node_kind::PA_ELEMENT, file_sym, open_line, open_col)
                });
                link_child(&mut content, root, &mut stack, &mut root_last_child, node);

                let ident = content.add_node(VObject {
                    parent: node,
                    ..VObject::new(name_sym, node_kind::PA_IDENTIFIER, file_sym, line_no, col)
                });
                if let Some(obj) = content.node_mut(node) {
                    obj.child = ident;
                }

                let mut elem = DesignElement::new(name_sym, file_sym, kind, unit.next_element_id());
                elem.line = open_line;
                elem.column = open_col;
                elem.node = node;
                elem.parent = parent_node;
                elem.time_info = unit.time_info_at(file_sym, open_line);
                elements.push(elem);
                stack.push(OpenRegion {
                    kind,
                    elem_index: elements.len() - 1,
                    node,
                    last_child: NodeId::INVALID,
                });
                continue;
            }

            if let Some(kind) = opener(word) {
                pending = Some(kind);
                pending_pos = (line_no, col);
            } else if let Some(kind) = closer(word) {
                match stack.pop() {
                    Some(region) if region.kind == kind => {
                        let elem = &mut elements[region.elem_index];
                        elem.end_line = line_no;
                        elem.end_column = col + word.len() as u16;
                    }
                    _ => {
                        diagnostics.push(Diagnostic::new(
                            ErrorKind::PaSyntaxError,
                            Location::in_file(file_sym, line_no, col),
                        ));
                    }
                }
            }
        }
    }

    if pending.is_some() || !stack.is_empty() {
        let (line, col) = pending_pos;
        diagnostics.push(Diagnostic::new(
            ErrorKind::PaSyntaxError,
            Location::in_file(file_sym, line.max(1), col),
        ));
    }

    for elem in elements {
        let key = content.qualify(interner, elem.name);
        content.add_design_element(&key, elem);
    }

    ParseOutput {
        content,
        diagnostics,
    }
}

/// Attaches `node` as the next child of the innermost open region (or the
/// file root), maintaining sibling chains.
fn link_child(
    content: &mut FileContent,
    root: NodeId,
    stack: &mut [OpenRegion],
    root_last_child: &mut NodeId,
    node: NodeId,
) {
    if let Some(region) = stack.last_mut() {
        if region.last_child.is_invalid() {
            if let Some(parent) = content.node_mut(region.node) {
                // The first child slot is taken by the identifier node; the
                // nested element chains off it.
                if parent.child.is_invalid() {
                    parent.child = node;
                    region.last_child = node;
                    return;
                }
            }
        }
        let prev = if region.last_child.is_invalid() {
            content.node(region.node).map(|p| p.child).unwrap_or(NodeId::INVALID)
        } else {
            region.last_child
        };
        if let Some(prev_obj) = content.node_mut(prev) {
            prev_obj.sibling = node;
        }
        region.last_child = node;
    } else if root_last_child.is_invalid() {
        if let Some(root_obj) = content.node_mut(root) {
            root_obj.child = node;
        }
        *root_last_child = node;
    } else {
        if let Some(prev) = content.node_mut(*root_last_child) {
            prev.sibling = node;
        }
        *root_last_child = node;
    }
}

/// Iterates identifier-ish words of a line with their 1-based columns.
fn words(line: &str) -> impl Iterator<Item = (&str, u16)> {
    let bytes = line.as_bytes();
    let mut pos = 0usize;
    std::iter::from_fn(move || {
        while pos < bytes.len() {
            let c = bytes[pos] as char;
            if c.is_ascii_alphabetic() || c == '_' {
                let start = pos;
                while pos < bytes.len() {
                    let c = bytes[pos] as char;
                    if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                        pos += 1;
                    } else {
                        break;
                    }
                }
                return Some((&line[start..pos], (start + 1) as u16));
            }
            pos += 1;
        }
        None
    })
}
