//! Diagnostic severities and the closed set of diagnostic kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a diagnostic, ordered from least to most severe.
///
/// `Syntax` and `Fatal` are tracked separately from plain errors because
/// they map to distinct bits of the process return code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A low-priority remark.
    Note,
    /// An informational message.
    Info,
    /// A potential issue that does not stop compilation.
    Warning,
    /// A definite problem in the input.
    Error,
    /// A parser-reported syntax error.
    Syntax,
    /// An unrecoverable failure; sets the cancellation flag.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Note => "NOTE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Syntax => "SYNTAX",
            Severity::Fatal => "FATAL",
        };
        write!(f, "{s}")
    }
}

/// The closed enumeration of diagnostic kinds.
///
/// Each kind carries a fixed severity and a stable code string; the numeric
/// discriminant round-trips through cache files, so variants must keep
/// their values once released.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorKind {
    /// `-f` named an argument file that does not exist.
    CmdArgFileDoesNotExist = 1,
    /// Argument files recursed past the allowed depth.
    CmdArgFileRecursionLimit = 2,
    /// A source file on the command line does not exist.
    CmdSourceFileDoesNotExist = 3,
    /// A `-v` library file does not exist.
    CmdLibraryFileDoesNotExist = 4,
    /// A `-y` library path does not exist.
    CmdLibraryPathDoesNotExist = 5,
    /// An include path does not exist.
    CmdIncludePathDoesNotExist = 6,
    /// `-odir`/`-o` was given without a directory.
    CmdMissingOutputDir = 7,
    /// `-l` was given without a file.
    CmdMissingLogFile = 8,
    /// `-cache` was given without a directory.
    CmdMissingCacheDir = 9,
    /// `-mt`/`-mp` was given without a count.
    CmdMissingThreadCount = 10,
    /// The thread or process count is out of range.
    CmdInvalidThreadCount = 11,
    /// `-timescale=` was given without a value.
    CmdMissingTimescale = 12,
    /// `-d` was given without a level.
    CmdMissingDebugLevel = 13,
    /// The `-d` level is out of range.
    CmdInvalidDebugLevel = 14,
    /// An unrecognized `+` argument was ignored.
    CmdPlusArgIgnored = 15,
    /// An unrecognized `-` argument was ignored.
    CmdMinusArgIgnored = 16,
    /// The output directory could not be created.
    CmdCannotCreateOutputDir = 17,
    /// The cache directory could not be created.
    CmdCannotCreateCacheDir = 18,
    /// A file's parse-tree node count exceeded the cache capacity; caching
    /// is disabled for the remainder of the invocation.
    CmdCacheCapacityExceeded = 19,
    /// The log file is being created (informational).
    CmdCreatingLogFile = 20,
    /// `-fileunit` repeated while already in per-file mode.
    CmdSeparateCompilationUnitOn = 21,
    /// An included file could not be found on the include paths.
    PpIncludeFileDoesNotExist = 22,
    /// A malformed preprocessor directive.
    PpSyntaxError = 23,
    /// A parser syntax error.
    PaSyntaxError = 24,
    /// The batch file could not be read.
    CmdBatchFileDoesNotExist = 25,
}

impl ErrorKind {
    /// The fixed severity of this diagnostic kind.
    pub fn severity(self) -> Severity {
        use ErrorKind::*;
        match self {
            CmdArgFileDoesNotExist
            | CmdArgFileRecursionLimit
            | CmdSourceFileDoesNotExist
            | CmdLibraryFileDoesNotExist
            | CmdMissingOutputDir
            | CmdMissingLogFile
            | CmdMissingCacheDir
            | CmdMissingThreadCount
            | CmdInvalidThreadCount
            | CmdMissingTimescale
            | CmdMissingDebugLevel
            | CmdInvalidDebugLevel
            | PpIncludeFileDoesNotExist => Severity::Error,
            CmdLibraryPathDoesNotExist
            | CmdIncludePathDoesNotExist
            | CmdPlusArgIgnored
            | CmdMinusArgIgnored
            | CmdCacheCapacityExceeded => Severity::Warning,
            CmdCannotCreateOutputDir | CmdCannotCreateCacheDir | CmdBatchFileDoesNotExist => {
                Severity::Fatal
            }
            CmdCreatingLogFile => Severity::Info,
            CmdSeparateCompilationUnitOn => Severity::Note,
            PpSyntaxError | PaSyntaxError => Severity::Syntax,
        }
    }

    /// The stable code string, as it appears in the log file.
    pub fn code(self) -> &'static str {
        use ErrorKind::*;
        match self {
            CmdArgFileDoesNotExist => "CMD_DASH_F_FILE_DOES_NOT_EXIST",
            CmdArgFileRecursionLimit => "CMD_DASH_F_RECURSION_LIMIT",
            CmdSourceFileDoesNotExist => "CMD_VERILOG_FILE_DOES_NOT_EXIST",
            CmdLibraryFileDoesNotExist => "CMD_LIBRARY_FILE_DOES_NOT_EXIST",
            CmdLibraryPathDoesNotExist => "CMD_LIBRARY_PATH_DOES_NOT_EXIST",
            CmdIncludePathDoesNotExist => "CMD_INCLUDE_PATH_DOES_NOT_EXIST",
            CmdMissingOutputDir => "CMD_MISSING_ODIR",
            CmdMissingLogFile => "CMD_LOG_FILE_MISSING_FILE",
            CmdMissingCacheDir => "CMD_CACHE_MISSING_DIR",
            CmdMissingThreadCount => "CMD_MT_MISSING_LEVEL",
            CmdInvalidThreadCount => "CMD_MT_INCORRECT_LEVEL",
            CmdMissingTimescale => "CMD_TIMESCALE_MISSING_SETTING",
            CmdMissingDebugLevel => "CMD_DEBUG_MISSING_LEVEL",
            CmdInvalidDebugLevel => "CMD_DEBUG_INCORRECT_LEVEL",
            CmdPlusArgIgnored => "CMD_PLUS_ARG_IGNORED",
            CmdMinusArgIgnored => "CMD_MINUS_ARG_IGNORED",
            CmdCannotCreateOutputDir => "CMD_PP_CANNOT_CREATE_OUTPUT_DIR",
            CmdCannotCreateCacheDir => "CMD_PP_CANNOT_CREATE_CACHE_DIR",
            CmdCacheCapacityExceeded => "CMD_CACHE_CAPACITY_EXCEEDED",
            CmdCreatingLogFile => "CMD_CREATING_LOG_FILE",
            CmdSeparateCompilationUnitOn => "CMD_SEPARATE_COMPILATION_UNIT_ON",
            PpIncludeFileDoesNotExist => "PP_INCLUDE_FILE_DOES_NOT_EXIST",
            PpSyntaxError => "PP_SYNTAX_ERROR",
            PaSyntaxError => "PA_SYNTAX_ERROR",
            CmdBatchFileDoesNotExist => "CMD_BATCH_FILE_DOES_NOT_EXIST",
        }
    }

    /// Returns the numeric code stored in cache files.
    pub fn as_code(self) -> u16 {
        self as u16
    }

    /// Decodes a numeric code from a cache file. Unknown codes return `None`
    /// so stale caches degrade to a miss rather than a panic.
    pub fn from_code(code: u16) -> Option<Self> {
        use ErrorKind::*;
        Some(match code {
            1 => CmdArgFileDoesNotExist,
            2 => CmdArgFileRecursionLimit,
            3 => CmdSourceFileDoesNotExist,
            4 => CmdLibraryFileDoesNotExist,
            5 => CmdLibraryPathDoesNotExist,
            6 => CmdIncludePathDoesNotExist,
            7 => CmdMissingOutputDir,
            8 => CmdMissingLogFile,
            9 => CmdMissingCacheDir,
            10 => CmdMissingThreadCount,
            11 => CmdInvalidThreadCount,
            12 => CmdMissingTimescale,
            13 => CmdMissingDebugLevel,
            14 => CmdInvalidDebugLevel,
            15 => CmdPlusArgIgnored,
            16 => CmdMinusArgIgnored,
            17 => CmdCannotCreateOutputDir,
            18 => CmdCannotCreateCacheDir,
            19 => CmdCacheCapacityExceeded,
            20 => CmdCreatingLogFile,
            21 => CmdSeparateCompilationUnitOn,
            22 => PpIncludeFileDoesNotExist,
            23 => PpSyntaxError,
            24 => PaSyntaxError,
            25 => CmdBatchFileDoesNotExist,
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
