//! On-disk document record
//!
//! Each document lives in its own file:
//!
//! ```text
//! {"id": "<document id>", "document": "<original JSON body, as a string>"}
//! ```
//!
//! The body is stored as a string rather than an embedded object so the
//! exact bytes the client sent survive a restart.

use memdb_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskRecord {
    /// Document id
    pub id: String,
    /// JSON-encoded document body
    pub document: String,
}

impl DiskRecord {
    /// Build a record from a raw body
    ///
    /// Bodies are validated JSON before they reach disk, so lossy UTF-8
    /// conversion never alters them in practice.
    pub fn new(id: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            id: id.into(),
            document: String::from_utf8_lossy(raw).into_owned(),
        }
    }

    /// Serialize for writing
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a file's contents
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Serialization(format!("malformed document record: {}", e)))
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        self.document.as_bytes()
    }
}
