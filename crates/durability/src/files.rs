//! Per-document files
//!
//! Every document is flushed to `<data_dir>/<sha512(id)>.json`. Hashing the
//! id keeps file names filesystem-safe and stable across restarts.
//!
//! # Crash Safety
//!
//! Writes follow the write-fsync-rename pattern:
//! 1. Write to `<name>.json.tmp`
//! 2. fsync the temporary file
//! 3. Atomic rename to `<name>.json`
//!
//! Recovery only reads `*.json`, so a crash between steps leaves at most a
//! stray temporary file, never a half-written record.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use memdb_core::{sha512_hex, Result};
use tracing::debug;

use crate::record::DiskRecord;

/// Extension of persisted records
pub const RECORD_EXTENSION: &str = "json";

/// File name (without directory) for a document id
pub fn file_name_for(id: &str) -> String {
    format!("{}.{}", sha512_hex(id.as_bytes()), RECORD_EXTENSION)
}

/// The directory of persisted documents
#[derive(Debug, Clone)]
pub struct DocumentFiles {
    dir: PathBuf,
}

impl DocumentFiles {
    /// Open (creating if needed) the storage directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            create_private_dir(&dir)?;
        }
        Ok(Self { dir })
    }

    /// Storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `id`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(file_name_for(id))
    }

    /// Persist `raw` as the document `id`, replacing any previous version
    pub fn write(&self, id: &str, raw: &[u8]) -> Result<()> {
        let record = DiskRecord::new(id, raw);
        let bytes = record.to_bytes()?;
        let final_path = self.path_for(id);
        let temp_path = final_path.with_extension(format!("{}.tmp", RECORD_EXTENSION));

        {
            let mut file = private_file_options().open(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &final_path)?;
        debug!(target: "memdb::disk", id = %id, path = %final_path.display(), "Document flushed");
        Ok(())
    }

    /// Read back the record for `id`, `None` if it has no file
    pub fn read(&self, id: &str) -> Result<Option<DiskRecord>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(Some(DiskRecord::from_bytes(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read any record file
    pub fn read_path(&self, path: &Path) -> Result<DiskRecord> {
        let bytes = fs::read(path)?;
        DiskRecord::from_bytes(&bytes)
    }

    /// Delete the file for `id`; deleting a missing file is not an error
    pub fn delete(&self, id: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All record files, sorted by name
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_record = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION);
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Delete every record file, returning how many were removed
    ///
    /// Files that vanish concurrently are not counted and not an error.
    pub fn purge(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.list()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

#[cfg(unix)]
fn private_file_options() -> OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true).mode(0o600);
    options
}

#[cfg(not(unix))]
fn private_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    options
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DocumentFiles) {
        let temp_dir = TempDir::new().unwrap();
        let files = DocumentFiles::open(temp_dir.path().join("store")).unwrap();
        (temp_dir, files)
    }

    #[test]
    fn test_open_creates_directory() {
        let (_tmp, files) = setup();
        assert!(files.dir().is_dir());
    }

    #[test]
    fn test_file_name_is_hash_of_id() {
        let name = file_name_for("1");
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), 128 + ".json".len());
        assert_eq!(name, file_name_for("1"));
        assert_ne!(name, file_name_for("2"));
    }

    #[test]
    fn test_write_then_read() {
        let (_tmp, files) = setup();
        files.write("doc", br#"{"x":1}"#).unwrap();

        let record = files.read("doc").unwrap().unwrap();
        assert_eq!(record.id, "doc");
        assert_eq!(record.body(), br#"{"x":1}"#);
        assert!(files.read("missing").unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_and_leaves_no_temp_file() {
        let (_tmp, files) = setup();
        files.write("doc", br#"{"v":1}"#).unwrap();
        files.write("doc", br#"{"v":2}"#).unwrap();

        assert_eq!(files.read("doc").unwrap().unwrap().body(), br#"{"v":2}"#);
        let entries: Vec<_> = fs::read_dir(files.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_files_are_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_tmp, files) = setup();
        files.write("doc", b"{}").unwrap();
        let mode = fs::metadata(files.path_for("doc")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_tmp, files) = setup();
        files.write("doc", b"{}").unwrap();
        assert!(files.delete("doc").unwrap());
        assert!(!files.delete("doc").unwrap());
        assert!(files.read("doc").unwrap().is_none());
    }

    #[test]
    fn test_list_ignores_other_files() {
        let (_tmp, files) = setup();
        files.write("a", b"{}").unwrap();
        files.write("b", b"{}").unwrap();
        fs::write(files.dir().join("notes.txt"), b"ignore me").unwrap();
        fs::write(files.dir().join("half.json.tmp"), b"{").unwrap();

        assert_eq!(files.list().unwrap().len(), 2);
    }

    #[test]
    fn test_purge_removes_records_only() {
        let (_tmp, files) = setup();
        for id in ["a", "b", "c"] {
            files.write(id, b"{}").unwrap();
        }
        fs::write(files.dir().join("notes.txt"), b"keep").unwrap();

        assert_eq!(files.purge().unwrap(), 3);
        assert!(files.list().unwrap().is_empty());
        assert!(files.dir().join("notes.txt").exists());
    }
}
