//! Bundle loading errors

use std::path::Path;

use super::ExplodeError;

/// Creates an unreadable bundle error
pub fn unreadable(path: &Path, reason: impl ToString) -> ExplodeError {
    ExplodeError::ArchiveUnreadable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates an unrecognized bundle format error
pub fn unrecognized(path: &Path) -> ExplodeError {
    ExplodeError::ArchiveUnrecognized {
        path: path.display().to_string(),
    }
}

/// Creates an error for a bundle without configuration entries
pub fn empty(path: &Path) -> ExplodeError {
    ExplodeError::ArchiveEmpty {
        path: path.display().to_string(),
    }
}

/// Creates a malformed container error
pub fn malformed(path: &Path, reason: impl ToString) -> ExplodeError {
    ExplodeError::ArchiveMalformed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
