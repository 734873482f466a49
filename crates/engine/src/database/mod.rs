//! DocumentStore: the public face of the engine
//!
//! This module wires together:
//! - The in-memory `DocumentIndex`
//! - The per-document files on disk
//! - The document-mutation queue and its single consumer
//! - Startup recovery
//!
//! ## Write path
//!
//! Writes never touch the index directly. `add_document`, `remove_document`
//! and `remove_all_documents` validate their input and enqueue a
//! `DocumentMutation`; the persistence worker applies it to memory, then
//! disk, then notifies peers. Reads (`get`, `search`, `stats`) go straight
//! to the index.

pub mod config;

pub use config::{SearchConfig, StoreConfig, CONFIG_FILE_NAME, DEFAULT_DATA_DIR};

use memdb_core::{
    parse_document, AppState, ApplicationState, DocumentMutation, Error, NoopNotifier,
    PeerNotifier, Result, ALL_DOCUMENTS,
};
use memdb_durability::DocumentFiles;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::recovery::{recover, RecoveryReport};
use crate::search::{
    Criteria, DocumentIndex, QueryEvaluator, SearchHit, SearchOptions, SearchResults,
    SignificantTermsAnalyzer, SignificantTermsOptions,
};
use crate::worker::{NotifierSlot, PersistenceWorker};

/// Name reported by [`DocumentStore::welcome`]
pub const ENGINE_NAME: &str = "memdb";

// ============================================================================
// Reports
// ============================================================================

/// Counters reported by [`DocumentStore::stats`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Live documents
    pub document_count: usize,
    /// Distinct lookup keys
    pub inverted_index_count: usize,
    /// Peers currently considered reachable
    pub active_peers: Vec<String>,
}

/// Greeting reported by [`DocumentStore::welcome`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Welcome {
    /// Engine name
    pub engine: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Current application state
    pub state: AppState,
}

// ============================================================================
// DocumentStore
// ============================================================================

/// Embeddable JSON document store
pub struct DocumentStore {
    config: StoreConfig,
    state: Arc<ApplicationState>,
    index: Arc<DocumentIndex>,
    files: DocumentFiles,
    notifier: NotifierSlot,
    sender: UnboundedSender<DocumentMutation>,
    receiver: Mutex<Option<UnboundedReceiver<DocumentMutation>>>,
}

impl DocumentStore {
    /// Open a store keeping its documents in `data_dir`
    ///
    /// The store starts `initialising` and empty; call [`recover`](Self::recover)
    /// to load persisted documents and [`spawn_worker`](Self::spawn_worker)
    /// to start applying writes.
    pub fn open(config: StoreConfig, data_dir: impl AsRef<Path>) -> Result<Self> {
        config.validate()?;
        let files = DocumentFiles::open(data_dir)?;
        let state = Arc::new(ApplicationState::new());
        let index = Arc::new(DocumentIndex::new(
            Arc::clone(&state),
            config.index_options(),
        ));
        let (sender, receiver) = mpsc::unbounded_channel();
        let noop: Arc<dyn PeerNotifier> = Arc::new(NoopNotifier);

        info!(target: "memdb::store", dir = %files.dir().display(), hostname = %config.hostname, "Document store opened");
        Ok(Self {
            config,
            state,
            index,
            files,
            notifier: Arc::new(RwLock::new(noop)),
            sender,
            receiver: Mutex::new(Some(receiver)),
        })
    }

    /// Open the store based at `base`, reading or creating `memdb.toml` there
    pub fn open_dir(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let config = StoreConfig::load_or_create(base)?;
        let data_dir = config.data_dir(base);
        Self::open(config, data_dir)
    }

    /// Rebuild the index from disk and become `active`
    pub fn recover(&self) -> Result<RecoveryReport> {
        recover(&self.index, &self.files)
    }

    /// Start the single consumer of the document queue
    ///
    /// Must be called from within a tokio runtime, at most once.
    pub fn spawn_worker(&self) -> Result<JoinHandle<()>> {
        let receiver = self
            .receiver
            .lock()
            .take()
            .ok_or(Error::QueueClosed("document worker already started"))?;
        Ok(tokio::spawn(self.worker().run(receiver)))
    }

    /// A worker sharing this store's index, files and notifier
    pub fn worker(&self) -> PersistenceWorker {
        PersistenceWorker::new(
            Arc::clone(&self.index),
            self.files.clone(),
            Arc::clone(&self.notifier),
        )
    }

    /// Route peer notifications through `notifier`
    pub fn attach_notifier(&self, notifier: Arc<dyn PeerNotifier>) {
        *self.notifier.write() = notifier;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Configuration in effect
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Shared application state
    pub fn state(&self) -> &Arc<ApplicationState> {
        &self.state
    }

    /// The in-memory index
    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// The document files
    pub fn files(&self) -> &DocumentFiles {
        &self.files
    }

    /// A sender onto the document queue
    pub fn sender(&self) -> UnboundedSender<DocumentMutation> {
        self.sender.clone()
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Enqueue a mutation for the persistence worker
    pub fn enqueue(&self, mutation: DocumentMutation) -> Result<()> {
        debug!(target: "memdb::store", id = %mutation.id, action = ?mutation.action, "Mutation enqueued");
        self.sender
            .send(mutation)
            .map_err(|_| Error::QueueClosed("document"))
    }

    /// Validate `raw` and enqueue it under `id`, telling peers once applied
    ///
    /// The id must be non-empty and must not be the reserved [`ALL_DOCUMENTS`].
    pub fn add_document(&self, id: &str, raw: &[u8]) -> Result<()> {
        if id.is_empty() {
            return Err(Error::invalid_document("Document id must not be empty"));
        }
        if id == ALL_DOCUMENTS {
            return Err(Error::invalid_document(format!(
                "Document id '{ALL_DOCUMENTS}' is reserved"
            )));
        }
        parse_document(raw, &self.index.options().limits)?;
        self.enqueue(DocumentMutation::add(id, raw.to_vec(), true))
    }

    /// As [`add_document`](Self::add_document) under a fresh UUID, which is returned
    pub fn add_document_auto(&self, raw: &[u8]) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.add_document(&id, raw)?;
        Ok(id)
    }

    /// Enqueue removal of `id`
    pub fn remove_document(&self, id: &str) -> Result<()> {
        self.enqueue(DocumentMutation::remove(id, true))
    }

    /// Enqueue removal of every document
    pub fn remove_all_documents(&self) -> Result<()> {
        self.enqueue(DocumentMutation::remove_all(true))
    }

    /// Enqueue removal of every document matching `criteria`; returns how many
    pub fn delete_matching(&self, criteria: &Criteria) -> Result<usize> {
        let ids = self.search_ids(criteria)?;
        for id in &ids {
            self.remove_document(id)?;
        }
        info!(target: "memdb::store", count = ids.len(), "Delete by query enqueued");
        Ok(ids.len())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// The document stored under `id`
    pub fn get(&self, id: &str) -> Result<Value> {
        self.index.get(id)
    }

    /// Every id matching `criteria`, sorted
    pub fn search_ids(&self, criteria: &Criteria) -> Result<Vec<String>> {
        let mut ids = QueryEvaluator::new(&self.index).evaluate(criteria)?;
        ids.sort();
        Ok(ids)
    }

    /// One page of documents matching `criteria`
    pub fn search(&self, criteria: &Criteria, options: SearchOptions) -> Result<SearchResults> {
        let started = Instant::now();
        let size = options.size.unwrap_or(self.config.search.default_size);
        let page = QueryEvaluator::new(&self.index).search(
            criteria,
            options.from,
            size,
            options.significant_terms.is_some(),
        )?;

        let hits = page
            .ids
            .into_iter()
            .filter_map(|id| {
                self.index
                    .get(&id)
                    .ok()
                    .map(|document| SearchHit { id, document })
            })
            .collect();

        let significant_terms = match (&options.significant_terms, &page.all) {
            (Some(request), Some(all)) => {
                let defaults = self.config.significant_terms;
                let thresholds = SignificantTermsOptions {
                    threshold: request.threshold.unwrap_or(defaults.threshold),
                    minimum: request.minimum.unwrap_or(defaults.minimum),
                };
                Some(SignificantTermsAnalyzer::new(&self.index, thresholds).analyze(all, &request.field)?)
            }
            _ => None,
        };

        Ok(SearchResults {
            total_matches: page.total,
            hits,
            significant_terms,
            took: started.elapsed().as_millis() as u64,
        })
    }

    /// Document and lookup counts, plus active peers
    pub fn stats(&self) -> StoreStats {
        let index = self.index.stats();
        StoreStats {
            document_count: index.document_count,
            inverted_index_count: index.inverted_index_count,
            active_peers: self.notifier.read().active_peers(),
        }
    }

    /// Engine name, version and state
    pub fn welcome(&self) -> Welcome {
        Welcome {
            engine: ENGINE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            state: self.state.get(),
        }
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("dir", &self.files.dir())
            .field("state", &self.state.get())
            .field("index", &self.index)
            .finish()
    }
}
