//! Parse-tree nodes and the per-file node arena.
//!
//! Nodes are addressed by [`NodeId`] only — never by reference — because
//! they are serialized by index, restored in bulk, and linked to each other
//! (parent/child/sibling) through indices. Zero is the reserved invalid
//! node, and [`NodeArena`] owns that invariant: slot 0 is occupied by a
//! sentinel from construction, so no live node can ever be allocated there.

use serde::{Deserialize, Serialize};
use sylva_common::Symbol;

/// Identifier of a parse-tree node within one file content's arena.
///
/// Zero is reserved as the invalid node; live IDs start at one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The reserved invalid node.
    pub const INVALID: NodeId = NodeId(0);

    /// Creates a `NodeId` from a raw index, as stored in cache records.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index, as written into cache records.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the invalid node.
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }
}

/// One parse-tree node.
///
/// Parent/definition/child/sibling links are node IDs within the same file
/// content, never references; `kind` is an opaque grammar code owned by the
/// producing stage. Name and file are handles into the canonical symbol
/// table while in memory, and into the cache-local table on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VObject {
    /// The node's name symbol, if any.
    pub name: Symbol,
    /// Opaque grammar node code.
    pub kind: u16,
    /// The file this node was produced from.
    pub file: Symbol,
    /// 1-based start line.
    pub line: u32,
    /// 1-based start column.
    pub column: u16,
    /// 1-based end line.
    pub end_line: u32,
    /// 1-based end column.
    pub end_column: u16,
    /// Enclosing node.
    pub parent: NodeId,
    /// Defining node (e.g. a declaration for a use).
    pub definition: NodeId,
    /// First child.
    pub child: NodeId,
    /// Next sibling.
    pub sibling: NodeId,
}

impl VObject {
    /// The sentinel occupying arena slot 0.
    pub fn invalid() -> Self {
        Self {
            name: Symbol::BAD,
            kind: 0,
            file: Symbol::BAD,
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
            parent: NodeId::INVALID,
            definition: NodeId::INVALID,
            child: NodeId::INVALID,
            sibling: NodeId::INVALID,
        }
    }

    /// A named node of the given kind at a position.
    pub fn new(name: Symbol, kind: u16, file: Symbol, line: u32, column: u16) -> Self {
        Self {
            name,
            kind,
            file,
            line,
            column,
            end_line: line,
            end_column: column,
            ..Self::invalid()
        }
    }
}

/// Dense, append-only storage for one file's parse-tree nodes.
///
/// Construction plants the sentinel at slot 0, so [`alloc`](Self::alloc)
/// can never hand out [`NodeId::INVALID`] and every index stored in a
/// cache record round-trips unchanged. Nodes are never removed; IDs stay
/// stable for the lifetime of the arena.
#[derive(Debug)]
pub struct NodeArena {
    objects: Vec<VObject>,
}

impl NodeArena {
    /// Creates an arena holding only the reserved sentinel.
    pub fn new() -> Self {
        Self {
            objects: vec![VObject::invalid()],
        }
    }

    /// Appends a node and returns its ID. Never [`NodeId::INVALID`].
    pub fn alloc(&mut self, obj: VObject) -> NodeId {
        let id = NodeId(self.objects.len() as u32);
        self.objects.push(obj);
        id
    }

    /// Returns the node behind `id`, or `None` for the invalid node and
    /// out-of-range IDs (a stale index from a foreign cache record).
    pub fn get(&self, id: NodeId) -> Option<&VObject> {
        if id.is_invalid() {
            return None;
        }
        self.objects.get(id.0 as usize)
    }

    /// Mutable access to the node behind `id`, with the same range rules.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut VObject> {
        if id.is_invalid() {
            return None;
        }
        self.objects.get_mut(id.0 as usize)
    }

    /// Returns `true` if `id` is the sentinel or a live node of this arena.
    pub fn in_range(&self, id: NodeId) -> bool {
        (id.0 as usize) < self.objects.len()
    }

    /// Total slot count, counting the reserved sentinel. This is the number
    /// the cache capacity check compares against.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no live nodes have been allocated.
    pub fn is_empty(&self) -> bool {
        self.objects.len() == 1
    }

    /// Iterates the live nodes (the sentinel excluded) in ID order — the
    /// order they are serialized in.
    pub fn live(&self) -> impl Iterator<Item = (NodeId, &VObject)> {
        self.objects
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, obj)| (NodeId(i as u32), obj))
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}
