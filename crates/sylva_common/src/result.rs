//! Common result and error types for the Sylva frontend.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in Sylva), not a
/// user-facing problem. User errors flow through the diagnostics sink and
/// the operation still returns `Ok`, possibly with degraded output.
pub type SylvaResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in Sylva.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
