//! Startup recovery through a full node

use super::*;
use memdb::{AppState, DocumentFiles};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn restart_skips_corrupt_file() {
    let tmp = TempDir::new().unwrap();
    let files = DocumentFiles::open(tmp.path()).unwrap();
    files.write("1", br#"{"n":1}"#).unwrap();
    files.write("2", br#"{"n":2}"#).unwrap();
    std::fs::write(files.path_for("3"), b"not json at all").unwrap();

    let loopback = Arc::new(Loopback::default());
    let node = start_node(&loopback, tmp.path(), "http://a:9999", &[], SECRET).await;

    assert_eq!(node.recovery().recovered, 2);
    assert_eq!(node.recovery().skipped, 1);
    assert_eq!(node.store().stats().document_count, 2);
    assert_eq!(node.store().state().get(), AppState::Active);
    assert_eq!(node.store().get("2").unwrap(), json!({"n": 2}));
}

#[tokio::test]
async fn documents_survive_a_restart() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    {
        let node = start_node(&loopback, tmp.path(), "http://a:9999", &[], SECRET).await;
        node.store().add_document("kept", br#"{"v":"x"}"#).unwrap();
        eventually("document to reach disk", || {
            node.store().files().read("kept").unwrap().is_some()
        })
        .await;
        node.shutdown();
    }

    let node = start_node(&loopback, tmp.path(), "http://a:9999", &[], SECRET).await;
    assert_eq!(node.recovery().recovered, 1);
    assert_eq!(node.store().get("kept").unwrap(), json!({"v": "x"}));
}

#[tokio::test]
async fn start_dir_writes_default_config() {
    let tmp = TempDir::new().unwrap();
    let node = Node::start_dir(tmp.path(), NodeOptions::new(SECRET))
        .await
        .unwrap();

    assert!(tmp.path().join("memdb.toml").exists());
    assert_eq!(node.replicator().hostname(), "http://127.0.0.1:9999");
    assert_eq!(node.store().welcome().state, AppState::Active);
    node.shutdown();
}
