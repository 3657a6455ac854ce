// src/server/initialization.rs

//! Handles server initialization: building the shared state and binding the
//! listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::catalog::CatalogProvider;
use crate::core::player::Player;
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
///
/// Returns the context together with the sender that stops the server.
pub async fn setup(
    config: Config,
    player: Arc<dyn Player>,
    catalog: Arc<dyn CatalogProvider>,
) -> Result<(ServerContext, broadcast::Sender<()>)> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);
    let (stop_tx, stop_rx) = broadcast::channel(1);

    let host = config.host.clone();
    let port = config.port;
    let state = ServerState::new(config, player, catalog)
        .context("Failed to initialize server state")?;
    info!("Server state initialized.");

    // Failing to bind is fatal and goes back to the caller as-is.
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    info!(
        "Remote control server listening on {}",
        listener.local_addr().context("Listener has no local address")?
    );

    Ok((
        ServerContext {
            state,
            listener,
            shutdown_tx,
            stop_rx,
            background_tasks: JoinSet::new(),
        },
        stop_tx,
    ))
}

fn log_startup_info(config: &Config) {
    info!(
        "Starting remoteplay v{} (catalog '{}', {} device(s), read timeout {:?}).",
        env!("CARGO_PKG_VERSION"),
        config.catalog_path,
        config.devices.len(),
        config.read_timeout()
    );
    if config.close_notify_delay_ms > 0 {
        info!(
            "Close notifications are delayed by {} ms.",
            config.close_notify_delay_ms
        );
    }
}
