//! `line` directive translations recorded by the preprocessor.

use serde::{Deserialize, Serialize};
use sylva_common::Symbol;

/// One `` `line `` mapping: from this output line on, pretend we are at
/// `pretend_line` of `pretend_file`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTranslation {
    /// The file to report positions in.
    pub pretend_file: Symbol,
    /// The line of the directive in the real source.
    pub original_line: u32,
    /// The line to report from there on.
    pub pretend_line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let lt = LineTranslation {
            pretend_file: Symbol::from_raw(3),
            original_line: 10,
            pretend_line: 1,
        };
        assert_eq!(lt.original_line, 10);
        assert_eq!(lt.pretend_line, 1);
    }
}
