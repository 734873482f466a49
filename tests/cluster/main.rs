//! Cluster Test Suite
//!
//! Several nodes in one process, sharing a data directory and talking
//! through an in-process transport.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test cluster
//! cargo test --test cluster replication::
//! ```

mod replication;
mod restart;

use memdb::{
    Error, Node, NodeOptions, PeerNotifier, PeerReplicator, PeerTransport, Result, StoreConfig,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub const SECRET: &str = "cluster-secret";

/// Routes peer messages straight into the receiving node's replicator
///
/// A node can be addressed before it has registered (its handshake may
/// race its own startup); delivery waits briefly for it to appear.
#[derive(Default)]
pub struct Loopback {
    nodes: RwLock<HashMap<String, PeerReplicator>>,
}

impl Loopback {
    pub fn register(&self, node: &Node) {
        let replicator = node.replicator().clone();
        self.nodes
            .write()
            .unwrap()
            .insert(replicator.hostname().to_string(), replicator);
    }

    pub fn unregister(&self, hostname: &str) {
        self.nodes.write().unwrap().remove(hostname);
    }

    fn lookup(&self, hostname: &str) -> Option<PeerReplicator> {
        self.nodes.read().unwrap().get(hostname).cloned()
    }
}

impl PeerTransport for Loopback {
    fn send(&self, peer: &str, body: &[u8], signature: &str, nonce: &str) -> Result<()> {
        for _ in 0..50 {
            if let Some(replicator) = self.lookup(peer) {
                return replicator.receive(body, signature, nonce);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Err(Error::replication(format!("{} unreachable", peer)))
    }
}

pub fn config(hostname: &str, peers: &[&str]) -> StoreConfig {
    StoreConfig {
        hostname: hostname.to_string(),
        peers: peers.iter().map(|p| p.to_string()).collect(),
        ..StoreConfig::default()
    }
}

pub async fn start_node(
    loopback: &Arc<Loopback>,
    data_dir: &Path,
    hostname: &str,
    peers: &[&str],
    secret: &str,
) -> Node {
    let options = NodeOptions::new(secret).with_transport(loopback.clone());
    let node = Node::start(config(hostname, peers), data_dir, options)
        .await
        .unwrap();
    loopback.register(&node);
    node
}

pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

pub fn peers_of(node: &Node) -> Vec<String> {
    node.replicator().active_peers()
}
