//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while writing cache files.
///
/// Reads are fail-safe (`Option`-returning); this enum is for the save path,
/// where an I/O failure is worth reporting even though compilation proceeds
/// without the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error while writing a cache file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A record failed to serialize.
    #[error("cache serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/top.slpp"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("top.slpp"));
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "record too deep".to_string(),
        };
        assert!(err.to_string().contains("record too deep"));
    }
}
