//! Startup recovery
//!
//! Rebuilds the index from the storage directory:
//! 1. Scan every record file
//! 2. Enter `recovering`
//! 3. Index each record, without rewriting it and without telling peers
//! 4. Enter `active`, which fires the on-active callbacks (peer messages
//!    buffered during recovery are redriven there)
//!
//! A file that cannot be read, or whose document no longer validates, is
//! skipped; it never aborts recovery of the rest.

use memdb_core::{AppState, Result};
use memdb_durability::{scan_corpus, DocumentFiles};
use std::time::Instant;
use tracing::{info, warn};

use crate::search::DocumentIndex;

/// Outcome of a recovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Documents indexed
    pub recovered: usize,
    /// Files left out
    pub skipped: usize,
}

/// Rebuild `index` from `files`
///
/// Only a failure to list the storage directory is an error, and in that
/// case the application state is left unchanged.
pub fn recover(index: &DocumentIndex, files: &DocumentFiles) -> Result<RecoveryReport> {
    let started = Instant::now();
    let scan = scan_corpus(files)?;
    let state = index.state();
    state.set(AppState::Recovering);

    let mut report = RecoveryReport {
        recovered: 0,
        skipped: scan.skipped.len(),
    };

    for record in scan.records {
        match index.index(&record.id, record.body()) {
            Ok(()) => report.recovered += 1,
            Err(e) => {
                warn!(target: "memdb::recovery", id = %record.id, error = %e, "Skipping invalid document");
                report.skipped += 1;
            }
        }
    }

    info!(
        target: "memdb::recovery",
        recovered = report.recovered,
        skipped = report.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Recovery complete"
    );
    state.set(AppState::Active);
    Ok(report)
}
