//! Error envelope fixtures.

use fid_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::io;

/// Every stable code the workspace emits outside the config and trace
/// namespaces. Metric failures are recovered in place and never surface
/// as envelopes.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::invalid_input(),
        ErrorCode::not_found(),
        ErrorCode::io(),
        ErrorCode::internal(),
    ]
}

/// A trace file that does not exist, tagged the way the CLI tags it.
pub fn missing_trace_error(path: &str) -> ErrorEnvelope {
    ErrorEnvelope::from(io::Error::new(io::ErrorKind::NotFound, "no such trace"))
        .with_metadata("trace", path)
}

/// A retriable I/O failure while reading a trace.
pub fn trace_io_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::io(), "trace read interrupted", ErrorClass::Retriable)
}
