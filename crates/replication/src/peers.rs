//! Peer table
//!
//! Hostname -> active flag. Entries are never deleted once seen: a peer
//! that fails is only marked inactive, so bringing it back does not replay
//! the new-peer handshake.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Known peers of one node
#[derive(Debug)]
pub struct PeerTable {
    own_hostname: String,
    peers: RwLock<HashMap<String, bool>>,
}

impl PeerTable {
    /// Empty table for the node reachable at `own_hostname`
    pub fn new(own_hostname: impl Into<String>) -> Self {
        Self {
            own_hostname: own_hostname.into(),
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `hostname` may be added at all (non-empty, not this node)
    pub fn accepts(&self, hostname: &str) -> bool {
        !hostname.trim().is_empty() && hostname != self.own_hostname
    }

    /// Mark `hostname` active; returns true if it had been seen before
    ///
    /// Hostnames rejected by [`accepts`](Self::accepts) are ignored and
    /// reported as already known so no handshake is attempted.
    pub fn mark_active(&self, hostname: &str) -> bool {
        if !self.accepts(hostname) {
            return true;
        }
        self.peers
            .write()
            .insert(hostname.to_string(), true)
            .is_some()
    }

    /// Mark `hostname` inactive, keeping the entry
    pub fn mark_inactive(&self, hostname: &str) {
        if let Some(active) = self.peers.write().get_mut(hostname) {
            *active = false;
        }
    }

    /// Whether `hostname` is known and active
    pub fn is_active(&self, hostname: &str) -> bool {
        self.peers.read().get(hostname).copied().unwrap_or(false)
    }

    /// Whether `hostname` has ever been added
    pub fn is_known(&self, hostname: &str) -> bool {
        self.peers.read().contains_key(hostname)
    }

    /// Active peers, sorted
    pub fn active_peers(&self) -> Vec<String> {
        let mut active: Vec<String> = self
            .peers
            .read()
            .iter()
            .filter(|(_, active)| **active)
            .map(|(host, _)| host.clone())
            .collect();
        active.sort();
        active
    }

    /// Number of known peers, active or not
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// Whether no peer has been seen
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Forget every peer
    pub fn clear(&self) {
        self.peers.write().clear();
    }
}
