//! Node: one store plus its replicator, wired and running

use memdb_core::{CredentialStore, NoopCredentialStore, PeerNotifier, Result};
use memdb_engine::{DocumentStore, RecoveryReport, StoreConfig};
use memdb_replication::{HttpPeerTransport, MessageSigner, PeerReplicator, PeerTransport};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Collaborators a node is started with
pub struct NodeOptions {
    secret: Vec<u8>,
    transport: Option<Arc<dyn PeerTransport>>,
    credentials: Arc<dyn CredentialStore>,
}

impl NodeOptions {
    /// Options signing peer traffic with `secret`
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            transport: None,
            credentials: Arc::new(NoopCredentialStore),
        }
    }

    /// Deliver peer messages through `transport` instead of HTTP
    pub fn with_transport(mut self, transport: Arc<dyn PeerTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Reload users through `credentials` when a peer asks to
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// A running memdb node
///
/// Owns the document store, the peer replicator and the three queue
/// consumer tasks. Dropping the node leaves the tasks running until the
/// runtime shuts down; call [`shutdown`](Self::shutdown) to stop them.
pub struct Node {
    store: Arc<DocumentStore>,
    replicator: PeerReplicator,
    tasks: Vec<JoinHandle<()>>,
    recovery: RecoveryReport,
}

impl Node {
    /// Open the store in `data_dir`, start replication and recover
    ///
    /// The replicator is attached before recovery, so peer messages that
    /// arrive while documents are being loaded are buffered and applied
    /// once the node is `active`. Recovery reads every document file and
    /// runs on the blocking pool. Must be called from within a tokio
    /// runtime.
    pub async fn start(
        config: StoreConfig,
        data_dir: impl AsRef<Path>,
        options: NodeOptions,
    ) -> Result<Self> {
        let store = Arc::new(DocumentStore::open(config, data_dir)?);
        let config = store.config();

        let transport: Arc<dyn PeerTransport> = match options.transport {
            Some(transport) => transport,
            None => Arc::new(HttpPeerTransport::new(config.peer_timeout())),
        };
        let replicator = PeerReplicator::new(
            config.hostname.clone(),
            MessageSigner::new(options.secret),
            transport,
            Arc::clone(store.state()),
            store.sender(),
            options.credentials,
        );
        store.attach_notifier(Arc::new(replicator.clone()));

        let mut tasks = vec![store.spawn_worker()?];
        tasks.extend(replicator.start()?);
        replicator.set_peers(&config.peers);

        let recovering = Arc::clone(&store);
        let recovery = tokio::task::spawn_blocking(move || recovering.recover())
            .await
            .map_err(std::io::Error::other)??;
        info!(target: "memdb::node", hostname = %replicator.hostname(), documents = recovery.recovered, "Node started");

        Ok(Self {
            store,
            replicator,
            tasks,
            recovery,
        })
    }

    /// As [`start`](Self::start), reading or creating `<base>/memdb.toml`
    pub async fn start_dir(base: impl AsRef<Path>, options: NodeOptions) -> Result<Self> {
        let base = base.as_ref();
        let config = StoreConfig::load_or_create(base)?;
        let data_dir = config.data_dir(base);
        Self::start(config, data_dir, options).await
    }

    /// The document store
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// The peer replicator
    pub fn replicator(&self) -> &PeerReplicator {
        &self.replicator
    }

    /// Outcome of startup recovery
    pub fn recovery(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Verify and enqueue a message posted to `/_peer-message`
    pub fn receive_peer_message(&self, body: &[u8], signature: &str, nonce: &str) -> Result<()> {
        self.replicator.receive(body, signature, nonce)
    }

    /// Hostnames of active peers
    pub fn active_peers(&self) -> Vec<String> {
        self.replicator.active_peers()
    }

    /// Stop the queue consumers
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!(target: "memdb::node", hostname = %self.replicator.hostname(), "Node stopped");
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("store", &self.store)
            .field("replicator", &self.replicator)
            .finish()
    }
}
