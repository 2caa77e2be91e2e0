//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers for results carrying an `ErrorEnvelope`.
pub trait ResultExt<T> {
    /// Map the success value, preserving the error.
    fn map_ok<U, F>(self, op: F) -> Result<U>
    where
        F: FnOnce(T) -> U;

    /// Attach a metadata entry to the error, if any.
    fn with_context(self, key: &str, value: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn map_ok<U, F>(self, op: F) -> Result<U>
    where
        F: FnOnce(T) -> U,
    {
        self.map(op)
    }

    fn with_context(self, key: &str, value: impl Into<String>) -> Result<T> {
        self.map_err(|error| error.with_metadata(key, value))
    }
}
