//! JSON document helpers
//!
//! This module defines how documents are seen by the index:
//! - `parse_document`: raw bytes to a JSON object, enforcing [`DocumentLimits`]
//! - `flatten_document`: nested objects/arrays to dot-notation leaf pairs
//! - `remove_numeric_indices`: `tags.0` and `tags.1` both become `tags`
//!
//! # Document Size Limits
//!
//! | Limit | Default | Constant |
//! |-------|---------|----------|
//! | Max document size | 16 MB | [`MAX_DOCUMENT_SIZE`] |
//! | Max nesting depth | 100 levels | [`MAX_NESTING_DEPTH`] |

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::error::{Error, Result};

// =============================================================================
// Document Size Limits
// =============================================================================

/// Maximum document size in bytes (16 MB)
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Maximum nesting depth in a JSON document (100 levels)
///
/// Flattening is recursive, so this bounds stack use.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Error type for document limit violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Document exceeds maximum size
    #[error("document size {size} exceeds maximum of {max} bytes")]
    DocumentTooLarge {
        /// Actual document size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Document nesting exceeds maximum depth
    #[error("document nesting depth {depth} exceeds maximum of {max} levels")]
    NestingTooDeep {
        /// Actual nesting depth
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },
}

/// Configurable limits applied when a document is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLimits {
    /// Maximum raw document size in bytes
    pub max_document_size: usize,
    /// Maximum nesting depth of objects/arrays
    pub max_nesting_depth: usize,
}

impl Default for DocumentLimits {
    fn default() -> Self {
        Self {
            max_document_size: MAX_DOCUMENT_SIZE,
            max_nesting_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl DocumentLimits {
    /// Check a raw document against the limits
    pub fn validate(&self, raw_len: usize, value: &Value) -> std::result::Result<(), LimitError> {
        if raw_len > self.max_document_size {
            return Err(LimitError::DocumentTooLarge {
                size: raw_len,
                max: self.max_document_size,
            });
        }
        let depth = nesting_depth(value);
        if depth > self.max_nesting_depth {
            return Err(LimitError::NestingTooDeep {
                depth,
                max: self.max_nesting_depth,
            });
        }
        Ok(())
    }
}

/// Maximum nesting depth of a JSON value
///
/// Returns 0 for primitives (null, bool, number, string),
/// and counts nested objects/arrays.
pub fn nesting_depth(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => 0,
        Value::Array(arr) => 1 + arr.iter().map(nesting_depth).max().unwrap_or(0),
        Value::Object(obj) => 1 + obj.values().map(nesting_depth).max().unwrap_or(0),
    }
}

/// Parse raw bytes into a JSON object document
///
/// Documents must be JSON objects; arrays and scalars are rejected, as are
/// documents breaking `limits`.
pub fn parse_document(raw: &[u8], limits: &DocumentLimits) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|_| Error::invalid_document("Document is not valid JSON"))?;

    limits
        .validate(raw.len(), &value)
        .map_err(|e| Error::invalid_document(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::invalid_document("Document must be a JSON object")),
    }
}

// =============================================================================
// Flattening
// =============================================================================

/// Dot-notation path -> leaf value, ordered by path
pub type FlatDocument = BTreeMap<String, Value>;

/// Flatten a document to dot-notation leaf pairs
///
/// Nested objects contribute `parent.child` paths; array elements are
/// addressed by their position (`tags.0`, `tags.1`). Empty objects and
/// arrays produce no leaves.
pub fn flatten_document(document: &Map<String, Value>) -> FlatDocument {
    let mut flat = FlatDocument::new();
    for (key, value) in document {
        flatten_into(key.clone(), value, &mut flat);
    }
    flat
}

fn flatten_into(path: String, value: &Value, flat: &mut FlatDocument) {
    match value {
        Value::Object(children) => {
            for (key, child) in children {
                flatten_into(format!("{}.{}", path, key), child, flat);
            }
        }
        Value::Array(items) => {
            for (position, item) in items.iter().enumerate() {
                flatten_into(format!("{}.{}", path, position), item, flat);
            }
        }
        leaf => {
            flat.insert(path, leaf.clone());
        }
    }
}

/// Strip purely numeric segments from a flattened key
///
/// `interests.0` -> `interests`, `a.1.b.2` -> `a.b`.
pub fn remove_numeric_indices(dot_key: &str) -> String {
    dot_key
        .split('.')
        .filter(|segment| !segment.is_empty() && !segment.bytes().all(|b| b.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(".")
}
