//! Process-wide application state
//!
//! `initialising -> recovering -> active`, with a transient `truncating`
//! while the whole corpus is being dropped. Callbacks registered with
//! [`ApplicationState::on_become_active`] run after every transition into
//! `active` (never on `active -> active`).

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Readiness of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    /// Process started, nothing loaded yet
    Initialising,
    /// Replaying persisted documents
    Recovering,
    /// Serving; peer instructions are applied immediately
    Active,
    /// Dropping the whole corpus
    Truncating,
}

impl AppState {
    /// Lower-case name, as reported to clients
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Initialising => "initialising",
            AppState::Recovering => "recovering",
            AppState::Active => "active",
            AppState::Truncating => "truncating",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ActiveCallback = Arc<dyn Fn() + Send + Sync>;

/// Shared state machine gating peer-message application
pub struct ApplicationState {
    state: RwLock<AppState>,
    on_active: Mutex<Vec<ActiveCallback>>,
}

impl ApplicationState {
    /// New state machine in `initialising`
    pub fn new() -> Self {
        Self {
            state: RwLock::new(AppState::Initialising),
            on_active: Mutex::new(Vec::new()),
        }
    }

    /// Current state
    pub fn get(&self) -> AppState {
        *self.state.read()
    }

    /// Whether the node is `active`
    pub fn is_active(&self) -> bool {
        self.get() == AppState::Active
    }

    /// Move to `next`, firing the on-active callbacks when entering `active`
    ///
    /// Callbacks run on the calling thread after the state lock is released,
    /// so they may read the state themselves.
    pub fn set(&self, next: AppState) {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, next)
        };

        if previous != next {
            info!(target: "memdb::state", from = %previous, to = %next, "Application state changed");
        }

        if next == AppState::Active && previous != AppState::Active {
            let callbacks: Vec<ActiveCallback> = self.on_active.lock().clone();
            for callback in callbacks {
                callback();
            }
        }
    }

    /// Register a callback for every future transition into `active`
    pub fn on_become_active(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.on_active.lock().push(Arc::new(callback));
    }
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationState")
            .field("state", &self.get())
            .field("callbacks", &self.on_active.lock().len())
            .finish()
    }
}
