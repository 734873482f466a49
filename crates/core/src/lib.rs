//! Core types and traits for memdb
//!
//! This crate defines the foundational types shared by every layer:
//! - Error: Error type hierarchy
//! - Digest: SHA-512 hex helper used for lookup keys and file names
//! - JSON helpers: dot-notation flattening, numeric index stripping, document limits
//! - Messages: DocumentMutation, PeerMessage, PeerListMessage
//! - ApplicationState: process-wide readiness state machine
//! - Traits: seams between the engine and the replication layer (PeerNotifier, CredentialStore)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod digest;
pub mod error;
pub mod json;
pub mod message;
pub mod state;
pub mod traits;

pub use digest::{from_hex, sha512_hex, to_hex};
pub use error::{Error, Result};
pub use json::{
    flatten_document, nesting_depth, parse_document, remove_numeric_indices, DocumentLimits,
    FlatDocument, LimitError, MAX_DOCUMENT_SIZE, MAX_NESTING_DEPTH,
};
pub use message::{
    DocumentMutation, MutationAction, PeerAction, PeerListAction, PeerListMessage, PeerMessage,
    ALL_DOCUMENTS,
};
pub use state::{AppState, ApplicationState};
pub use traits::{CredentialStore, NoopCredentialStore, NoopNotifier, PeerNotifier};
