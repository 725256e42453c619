//! Macro definitions collected during preprocessing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Whether a macro takes arguments.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MacroKind {
    /// `` `define NAME body ``
    NoArgs,
    /// `` `define NAME(a, b) body ``
    WithArgs,
}

impl MacroKind {
    /// The small integer code stored in cache files.
    pub fn as_code(self) -> u16 {
        match self {
            MacroKind::NoArgs => 0,
            MacroKind::WithArgs => 1,
        }
    }

    /// Decodes a cache code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(MacroKind::NoArgs),
            1 => Some(MacroKind::WithArgs),
            _ => None,
        }
    }
}

/// One macro definition.
///
/// The name is the key of the owning [`MacroStorage`]. Argument names and
/// body tokens preserve their order; tokens may be empty strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDef {
    /// Argument-taking or plain.
    pub kind: MacroKind,
    /// 1-based line of the `` `define ``.
    pub start_line: u32,
    /// 1-based column of the `` `define ``.
    pub start_column: u16,
    /// 1-based line the definition ends on (after continuations).
    pub end_line: u32,
    /// 1-based end column.
    pub end_column: u16,
    /// Formal argument names, in declaration order.
    pub arguments: Vec<String>,
    /// Body tokens, in order.
    pub tokens: Vec<String>,
}

/// Macro table of one preprocessed file.
///
/// A `BTreeMap` so iteration — and therefore cache serialization — is in
/// name order regardless of definition order.
pub type MacroStorage = BTreeMap<String, MacroDef>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_roundtrip() {
        assert_eq!(MacroKind::from_code(0), Some(MacroKind::NoArgs));
        assert_eq!(MacroKind::from_code(1), Some(MacroKind::WithArgs));
        assert!(MacroKind::from_code(2).is_none());
    }

    #[test]
    fn storage_iterates_in_name_order() {
        let mut macros = MacroStorage::new();
        for name in ["ZED", "ALPHA", "MID"] {
            macros.insert(
                name.to_string(),
                MacroDef {
                    kind: MacroKind::NoArgs,
                    start_line: 1,
                    start_column: 1,
                    end_line: 1,
                    end_column: 1,
                    arguments: vec![],
                    tokens: vec![],
                },
            );
        }
        let names: Vec<&str> = macros.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ALPHA", "MID", "ZED"]);
    }

    #[test]
    fn tokens_may_be_empty_strings() {
        let def = MacroDef {
            kind: MacroKind::WithArgs,
            start_line: 1,
            start_column: 1,
            end_line: 1,
            end_column: 10,
            arguments: vec!["x".to_string()],
            tokens: vec!["".to_string(), "x".to_string()],
        };
        assert_eq!(def.tokens[0], "");
        assert_eq!(def.arguments.len(), 1);
    }
}
