//! memdb - Embeddable in-memory JSON document store
//!
//! Documents are indexed in memory for exact and partial-text retrieval,
//! written to one file each for crash recovery, and optionally kept in step
//! across peer instances with signed gossip.
//!
//! # Quick Start
//!
//! ```ignore
//! use memdb::{Criteria, Criterion, Node, NodeOptions, SearchOptions};
//!
//! let node = Node::start_dir("/var/lib/memdb", NodeOptions::new("shared-secret")).await?;
//! node.store().add_document("1", br#"{"a":{"b":"red car"}}"#)?;
//!
//! let criteria = Criteria::and(vec![Criterion::contains("a.b", "car")]);
//! let results = node.store().search(&criteria, SearchOptions::default())?;
//! ```
//!
//! # Architecture
//!
//! - `memdb-core`: errors, JSON helpers, queue messages, application state
//! - `memdb-durability`: per-document files
//! - `memdb-engine`: index, query evaluation, persistence worker, store
//! - `memdb-replication`: peer table, signing, transport, replicator
//!
//! [`Node`] wires them together for a running process.

mod node;

pub use node::{Node, NodeOptions};

pub use memdb_core::{
    AppState, ApplicationState, CredentialStore, DocumentMutation, Error, MutationAction,
    NoopCredentialStore, PeerAction, PeerMessage, PeerNotifier, Result, ALL_DOCUMENTS,
};
pub use memdb_durability::DocumentFiles;
pub use memdb_engine::{
    Criteria, Criterion, DocumentStore, RecoveryReport, SearchHit, SearchOptions, SearchResults,
    SignificantTerm, SignificantTermsRequest, StoreConfig, StoreStats, Welcome,
};
pub use memdb_replication::{
    HttpPeerTransport, MessageSigner, PeerReplicator, PeerTransport, NONCE_HEADER,
    PEER_MESSAGE_PATH, SIGNATURE_HEADER,
};

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`)
///
/// Intended for binaries and tests; libraries never call it. Does nothing if
/// a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
