//! Two- and three-node replication scenarios

use super::*;
use memdb::{AppState, Criteria, Criterion, DocumentMutation, ALL_DOCUMENTS};
use serde_json::json;
use tempfile::TempDir;

const A: &str = "http://a:9999";
const B: &str = "http://b:9999";
const C: &str = "http://c:9999";

async fn pair(loopback: &Arc<Loopback>, dir: &Path) -> (Node, Node) {
    let a = start_node(loopback, dir, A, &[], SECRET).await;
    let b = start_node(loopback, dir, B, &[A], SECRET).await;
    eventually("a and b to know each other", || {
        peers_of(&a) == vec![B] && peers_of(&b) == vec![A]
    })
    .await;
    (a, b)
}

#[tokio::test]
async fn handshake_links_both_nodes() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    assert_eq!(a.store().state().get(), AppState::Active);
    assert_eq!(b.store().state().get(), AppState::Active);
    assert_eq!(a.store().stats().active_peers, vec![B]);
}

#[tokio::test]
async fn document_added_on_one_node_is_readable_on_the_other() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    a.store()
        .add_document("1", br#"{"a":{"b":"red car"}}"#)
        .unwrap();

    eventually("b to index document 1", || b.store().get("1").is_ok()).await;
    assert_eq!(b.store().get("1").unwrap(), json!({"a": {"b": "red car"}}));

    let criteria = Criteria::and(vec![Criterion::contains("a.b", "car")]);
    assert_eq!(b.store().search_ids(&criteria).unwrap(), vec!["1"]);
}

#[tokio::test]
async fn removals_propagate_to_memory_only() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    for id in ["1", "2", "3"] {
        a.store().add_document(id, br#"{"v":1}"#).unwrap();
    }
    eventually("b to index three documents", || {
        b.store().stats().document_count == 3
    })
    .await;

    a.store().remove_document("2").unwrap();
    eventually("b to drop document 2", || b.store().get("2").is_err()).await;
    assert_eq!(b.store().index().all_ids(), vec!["1", "3"]);
    assert!(a.store().files().read("2").unwrap().is_none());

    a.store().remove_all_documents().unwrap();
    eventually("b to drop everything", || {
        b.store().stats().document_count == 0
    })
    .await;
    assert!(a.store().files().list().unwrap().is_empty());
}

#[tokio::test]
async fn removing_a_document_named_like_the_wildcard_spares_the_rest() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    assert!(matches!(
        a.store().add_document(ALL_DOCUMENTS, br#"{"v":1}"#),
        Err(Error::InvalidDocument(_))
    ));

    // Written straight to the queue, as a store populated before the id was reserved
    for id in ["keep", ALL_DOCUMENTS] {
        a.store()
            .enqueue(DocumentMutation::add(id, br#"{"v":1}"#.to_vec(), true))
            .unwrap();
    }
    eventually("b to index both documents", || {
        b.store().stats().document_count == 2
    })
    .await;

    a.store().remove_document(ALL_DOCUMENTS).unwrap();
    eventually("b to drop the wildcard-named document", || {
        b.store().get(ALL_DOCUMENTS).is_err()
    })
    .await;
    assert_eq!(b.store().index().all_ids(), vec!["keep"]);
    assert_eq!(a.store().index().all_ids(), vec!["keep"]);
    assert!(a.store().files().read("keep").unwrap().is_some());
}

#[tokio::test]
async fn updates_replace_the_peer_copy() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    a.store().add_document("doc", br#"{"colour":"red"}"#).unwrap();
    eventually("b to index doc", || b.store().get("doc").is_ok()).await;

    a.store().add_document("doc", br#"{"colour":"blue"}"#).unwrap();
    eventually("b to see the update", || {
        b.store().get("doc").ok() == Some(json!({"colour": "blue"}))
    })
    .await;

    let red = Criteria::and(vec![Criterion::equals("colour", "red")]);
    assert!(b.store().search_ids(&red).unwrap().is_empty());
}

#[tokio::test]
async fn third_node_learns_the_whole_cluster() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    let c = start_node(&loopback, tmp.path(), C, &[B], SECRET).await;
    eventually("c to learn about a through b", || {
        peers_of(&c) == vec![A, B]
    })
    .await;
    eventually("a to learn about c", || peers_of(&a) == vec![B, C]).await;

    a.store().add_document("x", br#"{"k":"v"}"#).unwrap();
    eventually("b and c to index x", || {
        b.store().get("x").is_ok() && c.store().get("x").is_ok()
    })
    .await;
}

#[tokio::test]
async fn unreachable_peer_is_demoted_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let (a, b) = pair(&loopback, tmp.path()).await;

    loopback.unregister(B);
    a.store().add_document("1", br#"{"v":1}"#).unwrap();

    eventually("a to demote b", || peers_of(&a).is_empty()).await;
    assert!(a.store().get("1").is_ok());
    assert!(b.store().get("1").is_err());
    assert!(a.replicator().peers().is_known(B));
}

#[tokio::test]
async fn mismatched_secret_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let loopback = Arc::new(Loopback::default());
    let a = start_node(&loopback, tmp.path(), A, &[], SECRET).await;
    let rogue = start_node(&loopback, tmp.path(), B, &[A], "wrong-secret").await;

    // a rejects the handshake, so rogue demotes a and a never learns of it
    eventually("rogue to demote a", || {
        rogue.replicator().peers().is_known(A) && peers_of(&rogue).is_empty()
    })
    .await;
    assert!(peers_of(&a).is_empty());
}
