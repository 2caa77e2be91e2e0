use fid_shared::{ErrorCode, ErrorEnvelope, ErrorKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    InvalidInput = 2,
    Io = 3,
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Map a structured error to the process exit code.
#[must_use]
pub fn envelope_exit_code(error: &ErrorEnvelope) -> ExitCode {
    if error.code == ErrorCode::io() || error.code == ErrorCode::not_found() {
        return ExitCode::Io;
    }
    match error.kind {
        ErrorKind::Expected => ExitCode::InvalidInput,
        ErrorKind::Invariant | ErrorKind::Unexpected => ExitCode::Internal,
    }
}

#[derive(Debug)]
pub enum CliError {
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(formatter, "invalid input: {message}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fid_shared::{ErrorClass, UnexpectedError, normalize_unexpected_error};

    #[test]
    fn expected_errors_are_invalid_input() {
        let error = ErrorEnvelope::expected(ErrorCode::new("trace", "invalid_step"), "bad step");
        assert_eq!(envelope_exit_code(&error), ExitCode::InvalidInput);
    }

    #[test]
    fn io_errors_keep_their_own_code() {
        let error = normalize_unexpected_error(UnexpectedError::Io(std::io::Error::other("disk")));
        assert_eq!(envelope_exit_code(&error), ExitCode::Io);

        let missing = ErrorEnvelope::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(envelope_exit_code(&missing), ExitCode::Io);
    }

    #[test]
    fn unexpected_errors_are_internal() {
        let error = ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            "serializer failed",
            ErrorClass::NonRetriable,
        );
        assert_eq!(envelope_exit_code(&error), ExitCode::Internal);
    }
}
