//! Interned symbols for cheap cloning and O(1) equality comparison.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// The string a dead or bad handle resolves to.
pub const UNKNOWN_SYMBOL: &str = "<unknown>";

/// The string interned at handle zero, denoting "no symbol".
pub const BAD_SYMBOL_TEXT: &str = "@@BAD_SYMBOL@@";

/// A handle to a string interned in a symbol table.
///
/// Symbols are `u32` indices into an interner. Handle zero is reserved for
/// the *bad symbol* sentinel, so handles for real strings are assigned
/// monotonically from one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    /// The sentinel handle denoting "no symbol".
    pub const BAD: Symbol = Symbol(0);

    /// Creates a `Symbol` from a raw `u32` index.
    ///
    /// Primarily intended for deserialization and testing. In normal use,
    /// symbols are created through [`Interner::register`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this symbol.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the bad-symbol sentinel.
    pub fn is_bad(self) -> bool {
        self == Self::BAD
    }
}

// SAFETY: `Symbol` wraps a `u32` which is always a valid `usize` on 32-bit
// and 64-bit platforms. `try_from_usize` rejects values that don't fit.
unsafe impl lasso::Key for Symbol {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Symbol)
    }
}

/// Thread-safe canonical string interner backed by [`lasso::ThreadedRodeo`].
///
/// One canonical table lives for the duration of an invocation and outlives
/// every per-file table. Writes are serialized internally; readers proceed
/// in parallel. There is no deletion.
///
/// Handle zero is always the bad-symbol sentinel.
pub struct Interner {
    rodeo: ThreadedRodeo<Symbol>,
}

impl Interner {
    /// Creates a new interner with the bad-symbol sentinel pre-registered
    /// at handle zero.
    pub fn new() -> Self {
        let rodeo = ThreadedRodeo::new();
        let bad = rodeo.get_or_intern(BAD_SYMBOL_TEXT);
        debug_assert_eq!(bad, Symbol::BAD);
        Self { rodeo }
    }

    /// Interns a string, returning its [`Symbol`]. Inserting the same string
    /// twice returns the same handle.
    pub fn register(&self, s: &str) -> Symbol {
        self.rodeo.get_or_intern(s)
    }

    /// Resolves a [`Symbol`] back to its string value.
    ///
    /// Total: handles not created by this interner resolve to
    /// [`UNKNOWN_SYMBOL`].
    pub fn symbol(&self, sym: Symbol) -> &str {
        self.rodeo.try_resolve(&sym).unwrap_or(UNKNOWN_SYMBOL)
    }

    /// Looks up a string without inserting. Returns [`Symbol::BAD`] if the
    /// string has not been interned.
    pub fn id(&self, s: &str) -> Symbol {
        self.rodeo.get(s).unwrap_or(Symbol::BAD)
    }

    /// Returns the number of interned strings, including the sentinel.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if only the sentinel is interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.register("top.sv");
        assert_eq!(interner.symbol(id), "top.sv");
    }

    #[test]
    fn register_is_idempotent() {
        let interner = Interner::new();
        let a = interner.register("work");
        let b = interner.register("work");
        assert_eq!(a, b);
    }

    #[test]
    fn handles_start_after_sentinel() {
        let interner = Interner::new();
        let id = interner.register("first");
        assert!(id.as_raw() >= 1);
    }

    #[test]
    fn bad_symbol_resolves_to_sentinel_text() {
        let interner = Interner::new();
        assert_eq!(interner.symbol(Symbol::BAD), BAD_SYMBOL_TEXT);
        assert!(Symbol::BAD.is_bad());
    }

    #[test]
    fn unknown_handle_resolves_to_unknown() {
        let interner = Interner::new();
        assert_eq!(interner.symbol(Symbol::from_raw(9999)), UNKNOWN_SYMBOL);
    }

    #[test]
    fn id_lookup_does_not_insert() {
        let interner = Interner::new();
        assert_eq!(interner.id("never registered"), Symbol::BAD);
        let before = interner.len();
        interner.id("never registered");
        assert_eq!(interner.len(), before);
    }

    #[test]
    fn concurrent_registration_is_stable() {
        use std::sync::Arc;
        use std::thread;

        let interner = Arc::new(Interner::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let interner = Arc::clone(&interner);
            handles.push(thread::spawn(move || {
                let mut ids = Vec::new();
                for i in 0..100 {
                    ids.push(interner.register(&format!("sym{i}")));
                }
                ids
            }));
        }
        let all: Vec<Vec<Symbol>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for ids in &all[1..] {
            assert_eq!(ids, &all[0]);
        }
    }

    #[test]
    fn serde_roundtrip() {
        let sym = Symbol::from_raw(42);
        let json = serde_json::to_string(&sym).unwrap();
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(sym, back);
    }
}
