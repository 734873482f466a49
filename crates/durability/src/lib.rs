//! Durability layer for memdb
//!
//! This crate handles everything that touches disk:
//!
//! - Record format: one JSON file per document, `{"id": .., "document": ".."}`
//! - `DocumentFiles`: crash-safe write (write, fsync, rename), read, delete, purge
//! - Corpus scan used by startup recovery, skipping unreadable files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod files;
pub mod record;
pub mod scan;

pub use files::{file_name_for, DocumentFiles, RECORD_EXTENSION};
pub use record::DiskRecord;
pub use scan::{scan_corpus, CorpusScan, SkippedFile};
