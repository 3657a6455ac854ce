// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use crate::connection::ConnectionHandler;
use anyhow::Result;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long handlers get to finish after being told to stop.
const HANDLER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The main server loop that accepts connections and handles graceful shutdown.
///
/// Returns an error only when the listening socket fails; the caller decides
/// whether to restart or report it.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let mut client_tasks = JoinSet::new();
    let accept_timeout = ctx.state.config.accept_timeout();

    let outcome: Result<()> = loop {
        tokio::select! {
            biased;

            // A closed channel means every handle is gone, which also stops the server.
            _ = ctx.stop_rx.recv() => {
                info!("Shutdown requested, no longer accepting connections.");
                break Ok(());
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => error!("Background task failed: {e:#}"),
                    Err(e) => error!("Background task panicked: {e:?}"),
                }
            },

            // Prune handlers that have already finished.
            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },

            accepted = tokio::time::timeout(accept_timeout, ctx.listener.accept()) => {
                match accepted {
                    // Expected; just re-check the signals above.
                    Err(_elapsed) => continue,
                    Ok(Ok((socket, addr))) => {
                        let (connection, kill_rx) = ctx.state.register_connection(addr);
                        info!("Accepted new connection {}", connection);

                        let state_clone = ctx.state.clone();
                        let global_shutdown_rx = ctx.shutdown_tx.subscribe();
                        client_tasks.spawn(async move {
                            let mut handler = ConnectionHandler::new(
                                socket,
                                connection,
                                state_clone,
                                kill_rx,
                                global_shutdown_rx,
                            );
                            if let Err(e) = handler.run().await {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                        });
                        ctx.state.notifier.publish();
                    }
                    // The peer gave up before we got to it; not a listener failure.
                    Ok(Err(e)) if matches!(
                        e.kind(),
                        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
                    ) => {
                        debug!("Transient accept error: {}", e);
                    }
                    Ok(Err(e)) => {
                        error!("Listening socket failed: {}", e);
                        break Err(anyhow::Error::new(e).context("Failed to accept connection"));
                    }
                }
            },
        }
    };

    info!("Shutting down. Sending signal to all tasks.");
    let _ = ctx.shutdown_tx.send(());
    let signalled = ctx.state.disconnect_all();
    debug!("Signalled {} connection handler(s).", signalled);
    drop(ctx.listener);

    if tokio::time::timeout(HANDLER_DRAIN_TIMEOUT, async {
        while client_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for connection handlers; aborting the rest.");
        client_tasks.shutdown().await;
    }
    info!(
        "All client connections closed ({} served since startup).",
        ctx.state.stats.get_total_connections()
    );

    while ctx.background_tasks.join_next().await.is_some() {}

    ctx.state.notifier.publish();
    info!("Server shutdown complete.");
    outcome
}
