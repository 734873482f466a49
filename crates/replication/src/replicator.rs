//! PeerReplicator: best-effort gossip between peers
//!
//! Two queues, each with a single consumer task:
//! - peer-list queue: adds and demotes entries of the [`PeerTable`]; adding
//!   a peer never seen before sends it an `update_peers` handshake
//! - peer-message queue: inbound instructions from other peers, applied
//!   once this node is `active` and buffered until then
//!
//! Outbound messages are signed and handed to the [`PeerTransport`] on the
//! blocking pool. There is no retry: a failed delivery only marks the peer
//! inactive, and the next handshake re-probes it.

use memdb_core::{
    ApplicationState, CredentialStore, DocumentMutation, Error, PeerAction, PeerListAction,
    PeerListMessage, PeerMessage, PeerNotifier, Result,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::peers::PeerTable;
use crate::signer::MessageSigner;
use crate::transport::PeerTransport;

struct Queues {
    peer_list: UnboundedReceiver<PeerListMessage>,
    peer_messages: UnboundedReceiver<PeerMessage>,
}

struct Inner {
    hostname: String,
    peers: PeerTable,
    signer: MessageSigner,
    transport: Arc<dyn PeerTransport>,
    state: Arc<ApplicationState>,
    documents: UnboundedSender<DocumentMutation>,
    credentials: Arc<dyn CredentialStore>,
    peer_list: UnboundedSender<PeerListMessage>,
    peer_messages: UnboundedSender<PeerMessage>,
    queues: Mutex<Option<Queues>>,
    buffered: Mutex<Vec<PeerMessage>>,
}

/// Replicates document changes to peers and applies theirs locally
///
/// Cheap to clone; clones share the peer table and queues.
#[derive(Clone)]
pub struct PeerReplicator {
    inner: Arc<Inner>,
}

impl PeerReplicator {
    /// Replicator for the node at `hostname`
    ///
    /// Inbound document instructions are enqueued on `documents`. Messages
    /// buffered while `state` is not active are redriven on every transition
    /// into `active`.
    pub fn new(
        hostname: impl Into<String>,
        signer: MessageSigner,
        transport: Arc<dyn PeerTransport>,
        state: Arc<ApplicationState>,
        documents: UnboundedSender<DocumentMutation>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let hostname = hostname.into();
        let (peer_list, peer_list_rx) = mpsc::unbounded_channel();
        let (peer_messages, peer_messages_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            peers: PeerTable::new(hostname.clone()),
            hostname,
            signer,
            transport,
            state: Arc::clone(&state),
            documents,
            credentials,
            peer_list,
            peer_messages,
            queues: Mutex::new(Some(Queues {
                peer_list: peer_list_rx,
                peer_messages: peer_messages_rx,
            })),
            buffered: Mutex::new(Vec::new()),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        state.on_become_active(move || {
            if let Some(inner) = weak.upgrade() {
                inner.redrive();
            }
        });

        Self { inner }
    }

    /// Start the peer-list and peer-message consumers
    ///
    /// Must be called from within a tokio runtime, at most once.
    pub fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        let queues = self
            .inner
            .queues
            .lock()
            .take()
            .ok_or(Error::QueueClosed("peer consumers already started"))?;

        let list_inner = Arc::clone(&self.inner);
        let mut peer_list = queues.peer_list;
        let list_task = tokio::spawn(async move {
            while let Some(message) = peer_list.recv().await {
                list_inner.apply_peer_list(message);
            }
        });

        let message_inner = Arc::clone(&self.inner);
        let mut peer_messages = queues.peer_messages;
        let message_task = tokio::spawn(async move {
            while let Some(message) = peer_messages.recv().await {
                message_inner.apply_peer_message(message);
            }
        });

        info!(target: "memdb::peers", hostname = %self.inner.hostname, "Peer replication started");
        Ok(vec![list_task, message_task])
    }

    /// This node's hostname
    pub fn hostname(&self) -> &str {
        &self.inner.hostname
    }

    /// The peer table
    pub fn peers(&self) -> &PeerTable {
        &self.inner.peers
    }

    /// Enqueue adding (or re-activating) `hostname`
    ///
    /// Empty hostnames and this node's own hostname are ignored.
    pub fn add_peer(&self, hostname: &str) {
        if self.inner.peers.accepts(hostname) {
            self.inner.send_peer_list(hostname, PeerListAction::Add);
        }
    }

    /// Enqueue marking `hostname` inactive
    pub fn remove_peer(&self, hostname: &str) {
        self.inner.send_peer_list(hostname, PeerListAction::Remove);
    }

    /// Forget every peer, then enqueue adding each of `hostnames`
    pub fn set_peers<S: AsRef<str>>(&self, hostnames: &[S]) {
        self.inner.peers.clear();
        for hostname in hostnames {
            self.add_peer(hostname.as_ref());
        }
    }

    /// Enqueue an inbound message whose authenticity is already established
    pub fn enqueue(&self, message: PeerMessage) -> Result<()> {
        self.inner
            .peer_messages
            .send(message)
            .map_err(|_| Error::QueueClosed("peer message"))
    }

    /// Verify and enqueue a raw inbound message
    ///
    /// `signature` and `nonce` are the `x-hmac-auth` / `x-hmac-nonce`
    /// header values.
    pub fn receive(&self, body: &[u8], signature: &str, nonce: &str) -> Result<()> {
        if !self.inner.signer.verify(body, nonce.as_bytes(), signature) {
            return Err(Error::replication("peer message signature mismatch"));
        }
        let message: PeerMessage = serde_json::from_slice(body)?;
        debug!(target: "memdb::peers", from = %message.from, action = ?message.action, "Peer message received");
        self.enqueue(message)
    }

    /// Sign and dispatch `message` to `message.to`
    ///
    /// Returns false without sending when the recipient is not an active
    /// peer or the message cannot be signed.
    pub fn contact(&self, message: PeerMessage) -> bool {
        self.inner.contact(message)
    }

    /// Tell every active peer to reload its users
    pub fn notify_users_changed(&self) {
        self.notify(PeerMessage::new(PeerAction::ReloadUsers, ""));
    }

    /// Messages waiting for this node to become active
    pub fn buffered_len(&self) -> usize {
        self.inner.buffered.lock().len()
    }
}

impl PeerNotifier for PeerReplicator {
    fn notify(&self, message: PeerMessage) {
        for peer in self.inner.peers.active_peers() {
            let mut addressed = message.clone();
            addressed.to = peer;
            self.inner.contact(addressed);
        }
    }

    fn active_peers(&self) -> Vec<String> {
        self.inner.peers.active_peers()
    }
}

impl std::fmt::Debug for PeerReplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerReplicator")
            .field("hostname", &self.inner.hostname)
            .field("peers", &self.inner.peers)
            .field("buffered", &self.buffered_len())
            .finish()
    }
}

impl Inner {
    fn send_peer_list(&self, hostname: &str, action: PeerListAction) {
        let message = PeerListMessage {
            hostname: hostname.to_string(),
            action,
        };
        if self.peer_list.send(message).is_err() {
            warn!(target: "memdb::peers", peer = %hostname, ?action, "Peer list queue closed");
        }
    }

    fn apply_peer_list(&self, message: PeerListMessage) {
        let host = message.hostname;
        match message.action {
            PeerListAction::Add => {
                if !self.peers.accepts(&host) {
                    return;
                }
                let known = self.peers.mark_active(&host);
                info!(target: "memdb::peers", peer = %host, "Peer added");
                if !known {
                    let mut handshake = PeerMessage::new(PeerAction::UpdatePeers, "");
                    handshake.to = host;
                    self.contact(handshake);
                }
            }
            PeerListAction::Remove => {
                self.peers.mark_inactive(&host);
                info!(target: "memdb::peers", peer = %host, "Peer marked inactive");
            }
        }
    }

    fn apply_peer_message(&self, message: PeerMessage) {
        // State is checked under the buffer lock so a concurrent redrive
        // cannot miss a message buffered just before activation.
        let ready = {
            let mut buffered = self.buffered.lock();
            if !self.state.is_active() {
                debug!(target: "memdb::peers", from = %message.from, action = ?message.action, state = %self.state.get(), "Peer message buffered until active");
                buffered.push(message);
                return;
            }
            std::mem::take(&mut *buffered)
        };

        for pending in ready {
            self.handle(pending);
        }
        self.handle(message);
    }

    fn redrive(&self) {
        let pending = std::mem::take(&mut *self.buffered.lock());
        if pending.is_empty() {
            return;
        }
        info!(target: "memdb::peers", count = pending.len(), "Redriving buffered peer messages");
        for message in pending {
            if self.peer_messages.send(message).is_err() {
                warn!(target: "memdb::peers", "Peer message queue closed during redrive");
                return;
            }
        }
    }

    fn handle(&self, message: PeerMessage) {
        let from = message.from.as_str();
        match message.action {
            PeerAction::UpdatePeers => {
                if self.peers.accepts(from) {
                    self.send_peer_list(from, PeerListAction::Add);
                }
                for host in &message.known_peers {
                    if self.peers.accepts(host) {
                        self.send_peer_list(host, PeerListAction::Add);
                    }
                }
            }
            PeerAction::ReindexDocument => {
                info!(target: "memdb::peers", from = %from, id = %message.document_id, "Peer instructed reindex from disk");
                self.send_document(DocumentMutation::reindex_from_disk(message.document_id.as_str()));
            }
            PeerAction::RemoveDocument => {
                info!(target: "memdb::peers", from = %from, id = %message.document_id, "Peer instructed removal from memory");
                self.send_document(DocumentMutation::remove_from_memory(message.document_id.as_str()));
            }
            PeerAction::RemoveAllDocuments => {
                info!(target: "memdb::peers", from = %from, "Peer instructed removal of all documents from memory");
                self.send_document(DocumentMutation::remove_all_from_memory());
            }
            PeerAction::ReloadUsers => {
                info!(target: "memdb::peers", from = %from, "Peer instructed users reload");
                self.credentials.reload();
            }
        }
    }

    fn send_document(&self, mutation: DocumentMutation) {
        if self.documents.send(mutation).is_err() {
            warn!(target: "memdb::peers", "Document queue closed, peer instruction dropped");
        }
    }

    fn contact(&self, mut message: PeerMessage) -> bool {
        let peer = message.to.clone();
        if !self.peers.is_active(&peer) {
            return false;
        }

        message.from = self.hostname.clone();
        message.known_peers = self.peers.active_peers();
        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(target: "memdb::peers", peer = %peer, error = %e, "Failed to encode peer message");
                return false;
            }
        };
        let nonce = Uuid::new_v4().to_string();
        let signature = match self.signer.sign(&payload, nonce.as_bytes()) {
            Ok(signature) => signature,
            Err(e) => {
                warn!(target: "memdb::peers", peer = %peer, error = %e, "Failed to sign peer message");
                return false;
            }
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!(target: "memdb::peers", peer = %peer, "No async runtime, peer message dropped");
            return false;
        };
        let transport = Arc::clone(&self.transport);
        let peer_list = self.peer_list.clone();
        let action = message.action;
        runtime.spawn_blocking(move || {
            if let Err(e) = transport.send(&peer, &payload, &signature, &nonce) {
                warn!(target: "memdb::peers", peer = %peer, ?action, error = %e, "Peer unreachable, marking inactive");
                let _ = peer_list.send(PeerListMessage {
                    hostname: peer,
                    action: PeerListAction::Remove,
                });
            }
        });
        true
    }
}
