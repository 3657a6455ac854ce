// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::{ConnectionDescriptor, ServerState};
use std::sync::Arc;
use tracing::debug;

/// Makes sure a connection is torn down even when its handler never reaches
/// its own cleanup (the task was aborted or panicked).
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    connection: ConnectionDescriptor,
    closed: bool,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, connection: ConnectionDescriptor) -> Self {
        Self {
            state,
            connection,
            closed: false,
        }
    }

    /// Records that the handler closed the connection itself.
    pub(crate) fn set_closed(&mut self) {
        self.closed = true;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!(
            "ConnectionGuard dropping, cleaning up resources for connection {}",
            self.connection
        );

        // Teardown needs the dispatch lock, which cannot be awaited here.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let state = self.state.clone();
                let connection = self.connection;
                handle.spawn(async move {
                    state.close_connection(&connection).await;
                });
            }
            Err(_) => {
                // No runtime left to run on; the process is going away.
                self.state.clients.remove(&self.connection.id);
            }
        }
    }
}
