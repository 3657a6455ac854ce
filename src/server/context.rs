// src/server/context.rs

use crate::core::state::ServerState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Holds all the initialized state required to run the server's main loop.
pub struct ServerContext {
    pub state: Arc<ServerState>,
    pub listener: TcpListener,
    /// Fans the shutdown out to connection handlers and background tasks.
    pub shutdown_tx: broadcast::Sender<()>,
    /// Fires when the owner asks the server to stop.
    pub stop_rx: broadcast::Receiver<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
}
