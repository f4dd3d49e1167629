//! Core error types for keytree
//!
//! Every error kind propagates as an ordinary return value up to the
//! command layer, which reports and aborts only the current command; a
//! failed command never takes down the session.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors produced by the tree core
#[derive(Error, Debug)]
pub enum Error {
    /// A path segment names neither a group nor an entry
    #[error("{name}: no such group or entry")]
    NotFound { name: String },

    /// Create, rename or move collides with an existing sibling
    #[error("a sibling named '{name}' already exists")]
    DuplicateName { name: String },

    /// A path addresses an entry before its final segment, ascends past the
    /// root, or attempts a structurally invalid move
    #[error("invalid path: {message}")]
    InvalidPath { message: String },

    /// Another session holds the advisory lock on the store
    #[error("store is locked by another session (lock file: {path})")]
    Locked { path: String },

    /// A node expected to be reachable from the root is missing, typically
    /// after an interrupted move; fatal for the operation, not the session
    #[error("tree corruption: {message}")]
    Corrupted { message: String },

    /// Open, read or write failure in the underlying store
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_path<S: Into<String>>(message: S) -> Self {
        Error::InvalidPath {
            message: message.into(),
        }
    }

    pub(crate) fn corrupted<S: Into<String>>(message: S) -> Self {
        Error::Corrupted {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound {
            name: "Work".to_string(),
        };
        assert_eq!(err.to_string(), "Work: no such group or entry");

        let err = Error::DuplicateName {
            name: "A".to_string(),
        };
        assert_eq!(err.to_string(), "a sibling named 'A' already exists");

        let err = Error::invalid_path("cannot go above root");
        assert_eq!(err.to_string(), "invalid path: cannot go above root");
    }

    #[test]
    fn test_backend_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let backend: BackendError = io.into();
        let err: Error = backend.into();
        assert!(matches!(err, Error::Backend(_)));
    }
}
