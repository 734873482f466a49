//! Queue message types
//!
//! Every mutation of shared state travels as one of these messages through a
//! single-consumer queue:
//! - `DocumentMutation`: consumed by the persistence worker
//! - `PeerMessage`: wire payload exchanged between peers, consumed by the replicator
//! - `PeerListMessage`: additions/removals to the peer table

use serde::{Deserialize, Serialize};

/// Reserved id carried by whole-corpus mutations; never a document id
pub const ALL_DOCUMENTS: &str = "_all";

/// What the persistence worker should do with a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    /// Index the document and write it to disk
    Add,
    /// Remove the document from the index and disk
    Remove,
    /// Remove every document from the index and disk
    RemoveAll,
    /// Re-read the document's file and index it, without rewriting the file
    ReindexFromDisk,
    /// Remove one document from the index only, leaving disk untouched
    RemoveFromMemory,
    /// Clear the index only, leaving disk untouched
    RemoveAllFromMemory,
}

/// A document mutation intent, consumed once by the persistence worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMutation {
    /// Document id (`ALL_DOCUMENTS` for whole-corpus actions)
    pub id: String,
    /// Raw JSON body (empty unless `action == Add`)
    pub document: Vec<u8>,
    /// Action to perform
    pub action: MutationAction,
    /// Whether peers should be told about the change
    pub propagate: bool,
}

impl DocumentMutation {
    /// Index `document` under `id` and persist it
    pub fn add(id: impl Into<String>, document: impl Into<Vec<u8>>, propagate: bool) -> Self {
        Self {
            id: id.into(),
            document: document.into(),
            action: MutationAction::Add,
            propagate,
        }
    }

    /// Remove `id` from memory and disk
    pub fn remove(id: impl Into<String>, propagate: bool) -> Self {
        Self::without_body(id, MutationAction::Remove, propagate)
    }

    /// Remove every document from memory and disk
    pub fn remove_all(propagate: bool) -> Self {
        Self::without_body(ALL_DOCUMENTS, MutationAction::RemoveAll, propagate)
    }

    /// Reload `id` from its file
    pub fn reindex_from_disk(id: impl Into<String>) -> Self {
        Self::without_body(id, MutationAction::ReindexFromDisk, false)
    }

    /// Drop `id` from memory only
    pub fn remove_from_memory(id: impl Into<String>) -> Self {
        Self::without_body(id, MutationAction::RemoveFromMemory, false)
    }

    /// Drop every document from memory only
    pub fn remove_all_from_memory() -> Self {
        Self::without_body(ALL_DOCUMENTS, MutationAction::RemoveAllFromMemory, false)
    }

    fn without_body(id: impl Into<String>, action: MutationAction, propagate: bool) -> Self {
        Self {
            id: id.into(),
            document: Vec::new(),
            action,
            propagate,
        }
    }

    /// Whether this mutation addresses the whole corpus
    pub fn targets_all(&self) -> bool {
        matches!(
            self.action,
            MutationAction::RemoveAll | MutationAction::RemoveAllFromMemory
        )
    }
}

/// Instruction carried by a peer message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerAction {
    /// Merge the sender and its known peers into the local peer table
    UpdatePeers,
    /// Re-read a document from the shared disk
    ReindexDocument,
    /// Drop a document from memory
    RemoveDocument,
    /// Drop every document from memory
    RemoveAllDocuments,
    /// Reload the credential store
    ReloadUsers,
}

/// Signed gossip payload exchanged between peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMessage {
    /// Sender hostname, filled in on dispatch
    #[serde(default)]
    pub from: String,
    /// Recipient hostname
    #[serde(default)]
    pub to: String,
    /// Active peers known to the sender
    #[serde(default)]
    pub known_peers: Vec<String>,
    /// Instruction
    pub action: PeerAction,
    /// Target document (empty for peer/user actions)
    #[serde(default)]
    pub document_id: String,
}

impl PeerMessage {
    /// New message with `action` about `document_id`; routing fields are filled on dispatch
    pub fn new(action: PeerAction, document_id: impl Into<String>) -> Self {
        Self {
            from: String::new(),
            to: String::new(),
            known_peers: Vec::new(),
            action,
            document_id: document_id.into(),
        }
    }

    /// The peer notification that mirrors a local document mutation, if any
    pub fn for_mutation(mutation: &DocumentMutation) -> Option<Self> {
        match mutation.action {
            MutationAction::Add => Some(Self::new(PeerAction::ReindexDocument, &mutation.id)),
            MutationAction::Remove => Some(Self::new(PeerAction::RemoveDocument, &mutation.id)),
            MutationAction::RemoveAll => Some(Self::new(PeerAction::RemoveAllDocuments, "")),
            MutationAction::ReindexFromDisk
            | MutationAction::RemoveFromMemory
            | MutationAction::RemoveAllFromMemory => None,
        }
    }
}

/// Peer table change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerListAction {
    /// Add or re-activate a peer
    Add,
    /// Mark a peer inactive
    Remove,
}

/// Message consumed by the peer-list queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerListMessage {
    /// Peer hostname
    pub hostname: String,
    /// Change to apply
    pub action: PeerListAction,
}
