//! Document engine for memdb
//!
//! This crate orchestrates the lower layers:
//! - Search: tokenizer, stemmer, inverted index, criteria evaluation, significant terms
//! - PersistenceWorker: single consumer of the document-mutation queue
//! - Recovery: rebuilding the index from disk at startup
//! - DocumentStore: configuration, queueing and the read/write API
//!
//! The engine is the only component that knows about both the in-memory
//! index and the files backing it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod recovery;
pub mod search;
pub mod worker;

pub use database::{DocumentStore, StoreConfig, StoreStats, Welcome};
pub use recovery::{recover, RecoveryReport};
pub use search::{
    Criteria, Criterion, DocumentIndex, IndexOptions, IndexStats, SearchHit, SearchOptions,
    SearchResults, SignificantTerm, SignificantTermsOptions, SignificantTermsRequest,
};
pub use worker::{NotifierSlot, PersistenceWorker};
