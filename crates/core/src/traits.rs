//! Core trait definitions
//!
//! These traits are the seams between layers that would otherwise depend on
//! each other: the persistence worker notifies peers through [`PeerNotifier`]
//! without knowing about HTTP, and the replicator reloads users through
//! [`CredentialStore`] without owning credential storage.

use crate::message::PeerMessage;

/// Outbound side of replication, as seen by the persistence worker
///
/// Implementations must not block: dispatch happens on background tasks and
/// failures only demote the affected peer.
pub trait PeerNotifier: Send + Sync {
    /// Send `message` to every active peer
    fn notify(&self, message: PeerMessage);

    /// Hostnames of peers currently considered active
    fn active_peers(&self) -> Vec<String>;
}

/// External credential subsystem
pub trait CredentialStore: Send + Sync {
    /// Re-read users after a peer changed them
    fn reload(&self);
}

/// Notifier for single-node deployments
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl PeerNotifier for NoopNotifier {
    fn notify(&self, _message: PeerMessage) {}

    fn active_peers(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Credential store that has nothing to reload
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCredentialStore;

impl CredentialStore for NoopCredentialStore {
    fn reload(&self) {}
}
