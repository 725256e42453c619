//! Time-scale directives recorded during preprocessing and parsing.

use serde::{Deserialize, Serialize};
use sylva_common::Symbol;

/// Where a `timescale` applies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TimeScope {
    /// Set globally on the command line.
    Global,
    /// Set inside a module.
    Module,
    /// Set at file scope by a directive.
    File,
}

impl TimeScope {
    /// The small integer code stored in cache files.
    pub fn as_code(self) -> u16 {
        match self {
            TimeScope::Global => 0,
            TimeScope::Module => 1,
            TimeScope::File => 2,
        }
    }

    /// Decodes a cache code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(TimeScope::Global),
            1 => Some(TimeScope::Module),
            2 => Some(TimeScope::File),
            _ => None,
        }
    }
}

/// A time unit as written in a `timescale` directive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
    /// Picoseconds.
    Picosecond,
    /// Femtoseconds.
    Femtosecond,
}

impl TimeUnit {
    /// The small integer code stored in cache files.
    pub fn as_code(self) -> u16 {
        match self {
            TimeUnit::Second => 0,
            TimeUnit::Millisecond => 1,
            TimeUnit::Microsecond => 2,
            TimeUnit::Nanosecond => 3,
            TimeUnit::Picosecond => 4,
            TimeUnit::Femtosecond => 5,
        }
    }

    /// Decodes a cache code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(TimeUnit::Second),
            1 => Some(TimeUnit::Millisecond),
            2 => Some(TimeUnit::Microsecond),
            3 => Some(TimeUnit::Nanosecond),
            4 => Some(TimeUnit::Picosecond),
            5 => Some(TimeUnit::Femtosecond),
            _ => None,
        }
    }

    /// Parses a unit suffix as written in source (`"ns"`, `"ps"`, ...).
    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "s" => Some(TimeUnit::Second),
            "ms" => Some(TimeUnit::Millisecond),
            "us" => Some(TimeUnit::Microsecond),
            "ns" => Some(TimeUnit::Nanosecond),
            "ps" => Some(TimeUnit::Picosecond),
            "fs" => Some(TimeUnit::Femtosecond),
            _ => None,
        }
    }
}

/// One recorded time-scale: unit and precision, with provenance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    /// Scope of the directive.
    pub scope: TimeScope,
    /// The file it was recorded in.
    pub file: Symbol,
    /// The line it was recorded at.
    pub line: u32,
    /// The time unit.
    pub unit: TimeUnit,
    /// Numeric multiplier of the unit (1, 10 or 100).
    pub unit_value: f64,
    /// The precision unit.
    pub precision: TimeUnit,
    /// Numeric multiplier of the precision.
    pub precision_value: f64,
}

impl Default for TimeInfo {
    fn default() -> Self {
        Self {
            scope: TimeScope::Global,
            file: Symbol::BAD,
            line: 0,
            unit: TimeUnit::Nanosecond,
            unit_value: 1.0,
            precision: TimeUnit::Nanosecond,
            precision_value: 1.0,
        }
    }
}
