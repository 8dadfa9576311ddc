//! File system errors

use std::path::Path;

use super::ExplodeError;

/// Creates a file write failed error
pub fn write_failed(path: &Path, reason: impl ToString) -> ExplodeError {
    ExplodeError::FileWriteFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> ExplodeError {
    ExplodeError::IoError {
        message: message.into(),
    }
}
