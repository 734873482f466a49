//! Error types for memdb
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for memdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for memdb
#[derive(Debug, Error)]
pub enum Error {
    /// Document body is not valid JSON or breaks a document limit
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Search criteria is not valid JSON or is structurally malformed
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// Document not found
    #[error("Document does not exist: {0}")]
    NotFound(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Peer signing, verification or dispatch failure
    #[error("Replication error: {0}")]
    Replication(String),

    /// A mutation queue consumer has shut down
    #[error("Queue closed: {0}")]
    QueueClosed(&'static str),
}

impl Error {
    /// Create an InvalidDocument error
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Error::InvalidDocument(msg.into())
    }

    /// Create an InvalidCriteria error
    pub fn invalid_criteria(msg: impl Into<String>) -> Self {
        Error::InvalidCriteria(msg.into())
    }

    /// Create a NotFound error for a document id
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound(id.into())
    }

    /// Create a Config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a Replication error
    pub fn replication(msg: impl Into<String>) -> Self {
        Error::Replication(msg.into())
    }

    /// Whether the error was caused by caller input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidDocument(_) | Error::InvalidCriteria(_) | Error::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
    }

    #[test]
    fn test_error_display_invalid_document() {
        let err = Error::invalid_document("Document is not valid JSON");
        let msg = err.to_string();
        assert!(msg.contains("Invalid document"));
        assert!(msg.contains("not valid JSON"));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::not_found("abc");
        assert_eq!(err.to_string(), "Document does not exist: abc");
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::invalid_criteria("x").is_client_error());
        assert!(Error::not_found("x").is_client_error());
        assert!(!Error::QueueClosed("documents").is_client_error());
        assert!(!Error::replication("x").is_client_error());
    }
}
