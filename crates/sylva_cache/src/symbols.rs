//! The cache-local symbol table.
//!
//! Each cache save builds a fresh table so on-disk handles are compact and
//! the file is self-contained. On restore, every string is re-interned into
//! the canonical table and handles are remapped.

use std::collections::HashMap;

use sylva_common::{Interner, Symbol};

/// String the cache-local table resolves dead handles to.
const UNKNOWN: &str = "<unknown>";

/// An insertion-ordered string table serialized alongside each cache record.
///
/// Handles are dense `u32` indices in registration order. Serialized as the
/// plain string vector; the lookup map is rebuilt on load.
#[derive(Debug, Default)]
pub struct CacheSymbols {
    index: HashMap<String, u32>,
    strings: Vec<String>,
}

impl CacheSymbols {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a table from the string vector of a cache record.
    pub fn from_strings(strings: Vec<String>) -> Self {
        let index = strings
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u32))
            .collect();
        Self { index, strings }
    }

    /// Interns a string, returning its dense handle.
    pub fn register(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.index.insert(s.to_string(), id);
        self.strings.push(s.to_string());
        id
    }

    /// Interns the canonical-table string behind `sym`.
    pub fn register_symbol(&mut self, interner: &Interner, sym: Symbol) -> u32 {
        self.register(interner.symbol(sym))
    }

    /// Resolves a handle; dead handles resolve to `"<unknown>"`.
    pub fn resolve(&self, id: u32) -> &str {
        self.strings
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    /// Re-interns the string behind a cache-local handle into the canonical
    /// table, returning the canonical symbol.
    pub fn to_canonical(&self, interner: &Interner, id: u32) -> Symbol {
        interner.register(self.resolve(id))
    }

    /// The serialized form: strings in handle order.
    pub fn into_strings(self) -> Vec<String> {
        self.strings
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if no strings are interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
