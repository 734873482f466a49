//! Delivery of signed peer messages
//!
//! [`PeerTransport`] is a blocking call; the replicator always runs it on
//! the blocking pool so a slow peer never holds up a queue consumer.

use memdb_core::{Error, Result};
use std::time::Duration;

use crate::signer::{NONCE_HEADER, SIGNATURE_HEADER};

/// Path peers accept messages on
pub const PEER_MESSAGE_PATH: &str = "/_peer-message";

/// The only status that counts as delivered
pub const ACCEPTED_STATUS: u16 = 202;

/// Sends one signed payload to one peer
pub trait PeerTransport: Send + Sync {
    /// Deliver `body` to `peer`; any error demotes the peer
    fn send(&self, peer: &str, body: &[u8], signature: &str, nonce: &str) -> Result<()>;
}

/// HTTP POST to `{peer}/_peer-message`
pub struct HttpPeerTransport {
    agent: ureq::Agent,
}

impl HttpPeerTransport {
    /// Client whose calls give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl PeerTransport for HttpPeerTransport {
    fn send(&self, peer: &str, body: &[u8], signature: &str, nonce: &str) -> Result<()> {
        let url = format!("{}{}", peer.trim_end_matches('/'), PEER_MESSAGE_PATH);
        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(NONCE_HEADER, nonce)
            .send(body)
            .map_err(|e| Error::replication(format!("{}: {}", url, e)))?;

        let status = response.status().as_u16();
        if status == ACCEPTED_STATUS {
            Ok(())
        } else {
            Err(Error::replication(format!(
                "{} answered {} instead of {}",
                url, status, ACCEPTED_STATUS
            )))
        }
    }
}

impl std::fmt::Debug for HttpPeerTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPeerTransport").finish_non_exhaustive()
    }
}
