//! Corruption handling tests
//!
//! These tests verify that damaged document files are contained:
//! - A flipped byte makes one record unreadable, not the directory
//! - Truncated records are skipped by the corpus scan
//! - Stray temporary files from an interrupted write are never read
//! - Foreign files in the directory are ignored

use memdb_durability::{scan_corpus, DocumentFiles};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use tempfile::TempDir;

fn populated(ids: &[&str]) -> (TempDir, DocumentFiles) {
    let temp_dir = TempDir::new().unwrap();
    let files = DocumentFiles::open(temp_dir.path()).unwrap();
    for id in ids {
        files
            .write(id, format!(r#"{{"id_copy":"{}"}}"#, id).as_bytes())
            .unwrap();
    }
    (temp_dir, files)
}

#[test]
fn test_flipped_byte_isolated_to_one_record() {
    let (_temp_dir, files) = populated(&["a", "b", "c"]);

    // Overwrite the opening brace of one record
    {
        let mut file = OpenOptions::new()
            .write(true)
            .open(files.path_for("b"))
            .unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(b"X").unwrap();
    }

    assert!(files.read("b").is_err());
    assert!(files.read("a").unwrap().is_some());

    let scan = scan_corpus(&files).unwrap();
    assert_eq!(scan.records.len(), 2);
    assert_eq!(scan.skipped.len(), 1);
    assert_eq!(scan.skipped[0].path, files.path_for("b"));
    assert!(!scan.skipped[0].reason.is_empty());
}

#[test]
fn test_truncated_record_skipped() {
    let (_temp_dir, files) = populated(&["a", "b"]);

    let path = files.path_for("a");
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let scan = scan_corpus(&files).unwrap();
    let ids: Vec<&str> = scan.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert_eq!(scan.skipped.len(), 1);
}

#[test]
fn test_empty_file_skipped() {
    let (_temp_dir, files) = populated(&["a"]);
    fs::write(files.path_for("ghost"), b"").unwrap();

    let scan = scan_corpus(&files).unwrap();
    assert_eq!(scan.records.len(), 1);
    assert_eq!(scan.skipped.len(), 1);
}

#[test]
fn test_interrupted_write_leaves_previous_version() {
    let (_temp_dir, files) = populated(&["a"]);

    // A crash after writing the temp file but before the rename
    let temp_path = files.path_for("a").with_extension("json.tmp");
    fs::write(&temp_path, br#"{"id":"a","document":"{\"v\":2}"}"#).unwrap();

    let record = files.read("a").unwrap().unwrap();
    assert_eq!(record.body(), br#"{"id_copy":"a"}"#);

    let scan = scan_corpus(&files).unwrap();
    assert_eq!(scan.records.len(), 1);
    assert!(scan.skipped.is_empty());
}

#[test]
fn test_foreign_files_ignored() {
    let (temp_dir, files) = populated(&["a"]);
    fs::write(temp_dir.path().join("notes.txt"), b"hello").unwrap();
    fs::create_dir(temp_dir.path().join("nested.json")).unwrap();

    assert_eq!(files.list().unwrap().len(), 1);
    assert_eq!(files.purge().unwrap(), 1);
    assert!(temp_dir.path().join("notes.txt").exists());
}

#[test]
fn test_valid_record_with_unexpected_fields() {
    let (_temp_dir, files) = populated(&[]);
    fs::write(
        files.path_for("x"),
        br#"{"id":"x","document":"{}","written_by":"older version"}"#,
    )
    .unwrap();

    let scan = scan_corpus(&files).unwrap();
    assert_eq!(scan.records.len(), 1);
    assert_eq!(scan.records[0].id, "x");
}
