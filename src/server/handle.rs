// src/server/handle.rs

//! The owner's view of a running server.

use crate::core::events::{ChangeObserver, SubscriptionId};
use crate::core::state::ServerState;
use anyhow::{Result, anyhow};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Stops the server from anywhere, e.g. a signal-handling task.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger(broadcast::Sender<()>);

impl ShutdownTrigger {
    pub fn fire(&self) {
        let _ = self.0.send(());
    }
}

/// A running server.
///
/// Dropping the handle (and every `ShutdownTrigger` taken from it) stops the
/// server as if `request_shutdown` had been called.
#[derive(Debug)]
pub struct ServerHandle {
    state: Arc<ServerState>,
    local_addr: SocketAddr,
    stop_tx: broadcast::Sender<()>,
    task: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub(crate) fn new(
        state: Arc<ServerState>,
        local_addr: SocketAddr,
        stop_tx: broadcast::Sender<()>,
        task: JoinHandle<Result<()>>,
    ) -> Self {
        Self {
            state,
            local_addr,
            stop_tx,
            task,
        }
    }

    /// The address actually bound, useful when the configured port was 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn connection_count(&self) -> usize {
        self.state.connection_count()
    }

    pub fn open_connection_exists(&self) -> bool {
        self.state.open_connection_exists()
    }

    pub fn authenticated_count(&self) -> usize {
        self.state.authenticated_count()
    }

    pub fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> SubscriptionId {
        self.state.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.notifier.unsubscribe(id)
    }

    pub fn request_shutdown(&self) {
        let _ = self.stop_tx.send(());
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger(self.stop_tx.clone())
    }

    /// Waits for the accept loop to finish, returning its failure if the
    /// listening socket broke.
    pub async fn wait(self) -> Result<()> {
        let Self { task, stop_tx, .. } = self;
        let result = task.await;
        drop(stop_tx);
        result.map_err(|e| anyhow!("Accept loop task failed: {e}"))?
    }
}
