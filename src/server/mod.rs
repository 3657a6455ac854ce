// src/server/mod.rs

use crate::config::Config;
use crate::core::catalog::{CatalogProvider, FileCatalog};
use crate::core::player::{Player, VirtualPlayer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

mod connection_loop;
mod context;
mod handle;
mod initialization;
mod metrics_server;
mod spawner;

pub use handle::{ServerHandle, ShutdownTrigger};

/// Binds the listener and starts accepting connections in the background.
pub async fn start(
    config: Config,
    player: Arc<dyn Player>,
    catalog: Arc<dyn CatalogProvider>,
) -> Result<ServerHandle> {
    // 1. Initialize server state and the listener.
    let (mut ctx, stop_tx) = initialization::setup(config, player, catalog).await?;

    // 2. Spawn all background tasks.
    spawner::spawn_all(&mut ctx);

    // 3. Start the connection acceptance loop.
    let state = ctx.state.clone();
    let local_addr = ctx
        .listener
        .local_addr()
        .context("Listener has no local address")?;
    let task = tokio::spawn(connection_loop::run(ctx));

    Ok(ServerHandle::new(state, local_addr, stop_tx, task))
}

/// The main server startup function for the binary: serves the on-disk
/// catalog with the built-in player until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let catalog = Arc::new(FileCatalog::new(&config.catalog_path));
    let player = Arc::new(VirtualPlayer::new());
    let handle = start(config, player, catalog).await?;

    let status_state = Arc::downgrade(handle.state());
    handle.subscribe(Arc::new(move || {
        if let Some(state) = status_state.upgrade() {
            info!(
                connections = state.connection_count(),
                authenticated = state.authenticated_count(),
                "Server status changed."
            );
        }
    }));

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let trigger = handle.shutdown_trigger();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
            _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
        }
        trigger.fire();
    });

    handle.wait().await
}
