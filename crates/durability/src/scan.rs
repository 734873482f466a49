//! Corpus scan for startup recovery
//!
//! Reads every record file in the storage directory. A file that cannot be
//! read or parsed is reported in [`CorpusScan::skipped`] and otherwise
//! ignored: one bad file must never abort recovery of the rest.

use std::path::PathBuf;

use memdb_core::Result;
use tracing::warn;

use crate::files::DocumentFiles;
use crate::record::DiskRecord;

/// A file left out of recovery
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Offending file
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Result of reading the whole storage directory
#[derive(Debug, Default)]
pub struct CorpusScan {
    /// Records that parsed, in file-name order
    pub records: Vec<DiskRecord>,
    /// Files that could not be used
    pub skipped: Vec<SkippedFile>,
}

/// Read every record in `files`
///
/// Only a failure to list the directory itself is an error.
pub fn scan_corpus(files: &DocumentFiles) -> Result<CorpusScan> {
    let mut scan = CorpusScan::default();

    for path in files.list()? {
        match files.read_path(&path) {
            Ok(record) => scan.records.push(record),
            Err(e) => {
                warn!(
                    target: "memdb::recovery",
                    path = %path.display(),
                    error = %e,
                    "Skipping unreadable document file"
                );
                scan.skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(scan)
}
