//! Persistence worker
//!
//! The single consumer of the document-mutation queue. Each message is
//! applied to the in-memory index first and mirrored to disk second; disk
//! failures are logged and swallowed, so memory stays authoritative until
//! the next successful write or restart.
//!
//! Because there is exactly one consumer, mutations of the same id are
//! applied in the order they were enqueued.

use memdb_core::{
    DocumentMutation, MutationAction, PeerMessage, PeerNotifier, Result,
};
use memdb_durability::DocumentFiles;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::search::DocumentIndex;

/// Replaceable handle to the peer notifier
///
/// Starts as a no-op and is swapped for the replicator once one exists.
pub type NotifierSlot = Arc<RwLock<Arc<dyn PeerNotifier>>>;

/// Applies document mutations to memory and disk
#[derive(Clone)]
pub struct PersistenceWorker {
    index: Arc<DocumentIndex>,
    files: DocumentFiles,
    notifier: NotifierSlot,
}

impl PersistenceWorker {
    /// Worker over `index` and `files`, notifying peers through `notifier`
    pub fn new(index: Arc<DocumentIndex>, files: DocumentFiles, notifier: NotifierSlot) -> Self {
        Self {
            index,
            files,
            notifier,
        }
    }

    /// Consume `queue` until every sender is dropped
    pub async fn run(self, mut queue: UnboundedReceiver<DocumentMutation>) {
        info!(target: "memdb::worker", dir = %self.files.dir().display(), "Persistence worker started");
        while let Some(mutation) = queue.recv().await {
            let id = mutation.id.clone();
            let action = mutation.action;
            if let Err(e) = self.apply(mutation) {
                warn!(target: "memdb::worker", id = %id, ?action, error = %e, "Mutation rejected");
            }
        }
        info!(target: "memdb::worker", "Document queue closed, persistence worker stopped");
    }

    /// Apply one mutation
    ///
    /// Only index failures are returned; disk failures are logged.
    pub fn apply(&self, mutation: DocumentMutation) -> Result<()> {
        let id = mutation.id.as_str();
        match mutation.action {
            MutationAction::Add => {
                self.index.index(id, &mutation.document)?;
                if let Err(e) = self.files.write(id, &mutation.document) {
                    warn!(target: "memdb::worker", id = %id, error = %e, "Failed to flush document to disk");
                }
            }
            MutationAction::Remove => {
                self.index.remove(id);
                if let Err(e) = self.files.delete(id) {
                    warn!(target: "memdb::worker", id = %id, error = %e, "Failed to delete document file");
                }
            }
            MutationAction::RemoveAll => {
                self.index.remove_all();
                match self.files.purge() {
                    Ok(removed) => {
                        debug!(target: "memdb::worker", removed, "Document files purged")
                    }
                    Err(e) => {
                        warn!(target: "memdb::worker", error = %e, "Failed to purge document files")
                    }
                }
            }
            MutationAction::ReindexFromDisk => match self.files.read(id)? {
                Some(record) => self.index.index(id, record.body())?,
                None => {
                    debug!(target: "memdb::worker", id = %id, "No file to reindex from, dropping from memory");
                    self.index.remove(id);
                }
            },
            MutationAction::RemoveFromMemory => {
                self.index.remove(id);
            }
            MutationAction::RemoveAllFromMemory => self.index.remove_all(),
        }

        if mutation.propagate {
            if let Some(message) = PeerMessage::for_mutation(&mutation) {
                self.notifier.read().notify(message);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PersistenceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceWorker")
            .field("dir", &self.files.dir())
            .finish()
    }
}
