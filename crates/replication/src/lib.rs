//! Peer replication for memdb
//!
//! Nodes sharing a data directory keep their in-memory indexes in step by
//! telling each other what changed:
//! - PeerTable: hostname -> active flag
//! - MessageSigner: HMAC-SHA512 over `payload || nonce`
//! - PeerTransport: delivery of one signed message (HTTP via ureq)
//! - PeerReplicator: the peer-list and peer-message queues and their consumers
//!
//! Replication is last-writer-wins and best-effort. Delivery failures are
//! never surfaced to the writer; they only mark the peer inactive.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod peers;
pub mod replicator;
pub mod signer;
pub mod transport;

pub use peers::PeerTable;
pub use replicator::PeerReplicator;
pub use signer::{MessageSigner, NONCE_HEADER, SIGNATURE_HEADER};
pub use transport::{HttpPeerTransport, PeerTransport, ACCEPTED_STATUS, PEER_MESSAGE_PATH};
