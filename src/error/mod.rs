//! Error types and handling for bigip-explode
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Only failures that leave nothing to explode live here. Problems scoped to a
//! single statement, object or application are recorded in
//! [`crate::stats::Stats`] instead and never abort a run.
//!
//! This module is organized into sub-modules by error domain:
//! - [`archive`]: Bundle loading errors
//! - [`config`]: Configuration file errors
//! - [`fs`]: File system errors

pub mod archive;
pub mod config;
pub mod fs;

pub use archive::{
    empty as archive_empty, malformed as archive_malformed, unreadable as archive_unreadable,
    unrecognized as archive_unrecognized,
};
pub use config::{
    invalid as config_invalid, parse_failed as config_parse_failed,
    read_failed as config_read_failed,
};
pub use fs::{io_error, write_failed as file_write_failed};

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for bigip-explode operations
#[derive(Error, Diagnostic, Debug)]
pub enum ExplodeError {
    // Archive errors
    #[error("Failed to read bundle '{path}': {reason}")]
    #[diagnostic(
        code(bigip_explode::archive::unreadable),
        help("Check that the path exists and is readable")
    )]
    ArchiveUnreadable { path: String, reason: String },

    #[error("Unrecognized bundle format: {path}")]
    #[diagnostic(
        code(bigip_explode::archive::unrecognized),
        help(
            "Supported bundles: plain bigip.conf text, UCS archives, qkview snapshots and object exports (.json)"
        )
    )]
    ArchiveUnrecognized { path: String },

    #[error("No configuration files found in bundle: {path}")]
    #[diagnostic(
        code(bigip_explode::archive::empty),
        help("Archives must contain config/bigip.conf or another configured include entry")
    )]
    ArchiveEmpty { path: String },

    #[error("Malformed archive '{path}': {reason}")]
    #[diagnostic(code(bigip_explode::archive::malformed))]
    ArchiveMalformed { path: String, reason: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(bigip_explode::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(bigip_explode::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(bigip_explode::config::invalid))]
    ConfigInvalid { message: String },

    // File system errors
    #[error("Failed to write file: {path}")]
    #[diagnostic(code(bigip_explode::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(bigip_explode::fs::io_error))]
    IoError { message: String },

    // CLI errors
    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(bigip_explode::cli::unknown_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnknownShell { shell: String },
}

impl ExplodeError {
    /// Whether this error came from the bundle loader
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            ExplodeError::ArchiveUnreadable { .. }
                | ExplodeError::ArchiveUnrecognized { .. }
                | ExplodeError::ArchiveEmpty { .. }
                | ExplodeError::ArchiveMalformed { .. }
        )
    }
}

impl From<std::io::Error> for ExplodeError {
    fn from(err: std::io::Error) -> Self {
        ExplodeError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ExplodeError {
    fn from(err: serde_yaml::Error) -> Self {
        ExplodeError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExplodeError {
    fn from(err: serde_json::Error) -> Self {
        ExplodeError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ExplodeError>;
