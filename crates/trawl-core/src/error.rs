//! Error types for Trawl core operations.
//!
//! Library code returns [`TrawlError`] through the crate [`Result`] alias;
//! frontends wrap it in `anyhow` for reporting.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using TrawlError
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Core error types for Trawl operations.
#[derive(Error, Debug)]
pub enum TrawlError {
    // === Filesystem Errors ===
    /// A root directory, index file or operation target does not exist
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    /// Something already exists where a file was about to be created
    #[error("already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The path exists but is not a directory
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Permission denied when accessing the filesystem
    #[error("permission denied: {operation} on {path}")]
    PermissionDenied { operation: String, path: PathBuf },

    /// Read, write, copy, move or delete failure
    #[error("I/O error: {operation} {path}: {source}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // === Index Errors ===
    /// The persisted index exists but could not be parsed
    #[error("malformed index {path}: {reason}")]
    MalformedIndex { path: PathBuf, reason: String },

    // === Worker Errors ===
    /// The user stopped the operation
    #[error("operation cancelled")]
    Cancelled,

    /// A worker or file operation is already outstanding
    #[error("busy: {0}")]
    Busy(String),

    /// The request does not fit the current state (e.g. nothing to resume)
    #[error("{0}")]
    InvalidState(String),

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    Config { reason: String },

    // === External Applications ===
    /// Opening a file or revealing it in the file manager failed
    #[error("failed to launch {action} for {path}: {reason}")]
    Launch {
        action: String,
        path: PathBuf,
        reason: String,
    },

    // === Serialization Errors ===
    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TrawlError {
    /// Classify an `io::Error` raised while performing `operation` on `path`.
    pub fn from_io(err: io::Error, operation: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => TrawlError::NotFound { path },
            io::ErrorKind::AlreadyExists => TrawlError::AlreadyExists { path },
            io::ErrorKind::PermissionDenied => TrawlError::PermissionDenied {
                operation: operation.into(),
                path,
            },
            _ => TrawlError::Io {
                operation: operation.into(),
                path,
                source: err,
            },
        }
    }

    /// Create a malformed-index error
    pub fn malformed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        TrawlError::MalformedIndex {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error reports a missing path
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrawlError::NotFound { .. })
    }

    /// Returns true if the error reports an occupied destination
    pub fn is_already_exists(&self) -> bool {
        matches!(self, TrawlError::AlreadyExists { .. })
    }

    /// Returns true if this is a user-initiated cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TrawlError::Cancelled)
    }
}

impl From<serde_json::Error> for TrawlError {
    fn from(err: serde_json::Error) -> Self {
        TrawlError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kind() {
        let err = TrawlError::from_io(
            io::Error::new(io::ErrorKind::NotFound, "gone"),
            "read",
            "/missing",
        );
        assert!(err.is_not_found());

        let err = TrawlError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "nope"),
            "read",
            "/root",
        );
        assert!(matches!(err, TrawlError::PermissionDenied { .. }));

        let err = TrawlError::from_io(
            io::Error::new(io::ErrorKind::AlreadyExists, "taken"),
            "copy",
            "/dest/a.txt",
        );
        assert!(err.is_already_exists());

        let err = TrawlError::from_io(io::Error::new(io::ErrorKind::Other, "disk"), "write", "/x");
        assert!(matches!(err, TrawlError::Io { .. }));
        assert!(err.to_string().contains("write"));
    }

    #[test]
    fn test_cancelled_is_not_failure() {
        assert!(TrawlError::Cancelled.is_cancelled());
        assert!(!TrawlError::Busy("worker".into()).is_cancelled());
    }
}
