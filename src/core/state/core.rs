// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::*;
use super::stats::StatsState;
use crate::config::Config;
use crate::core::RemotePlayError;
use crate::core::acl::DeviceRegistry;
use crate::core::catalog::CatalogProvider;
use crate::core::events::ChangeNotifier;
use crate::core::handler::CommandDispatcher;
use crate::core::metrics;
use crate::core::player::Player;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

/// The central struct holding all shared, server-wide state.
///
/// Wrapped in an `Arc` and handed to the acceptor and to every connection
/// handler. The counters read by observers (`connection_count`,
/// `authenticated_count`) never need the dispatch lock.
#[derive(Debug)]
pub struct ServerState {
    /// The configuration the server was started with.
    pub config: Config,
    /// Every live connection handler, keyed by connection id.
    pub clients: ClientMap,
    /// The server-wide dispatch lock. Owns the session table and the
    /// collaborators; at most one command executes at any time.
    pub dispatcher: Mutex<CommandDispatcher>,
    /// Signals local observers that counts or playback may have changed.
    pub notifier: Arc<ChangeNotifier>,
    /// Holds all server-wide statistics.
    pub stats: StatsState,
    authenticated: Arc<AtomicUsize>,
    next_connection_id: AtomicU64,
}

impl ServerState {
    /// Builds the state from the configuration and the two collaborators.
    pub fn new(
        config: Config,
        player: Arc<dyn Player>,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Result<Arc<Self>, RemotePlayError> {
        let devices = DeviceRegistry::from_config(&config.devices)?;
        info!("{} device(s) may authenticate.", devices.len());

        let dispatcher = CommandDispatcher::new(devices, player, catalog);
        let authenticated = dispatcher.sessions().live_count();

        Ok(Arc::new(Self {
            config,
            clients: Arc::new(DashMap::new()),
            dispatcher: Mutex::new(dispatcher),
            notifier: Arc::new(ChangeNotifier::new()),
            stats: StatsState::new(),
            authenticated,
            next_connection_id: AtomicU64::new(1),
        }))
    }

    /// Assigns the next connection id and adds the connection to the registry.
    /// The returned receiver fires when this one connection should stop.
    pub fn register_connection(
        &self,
        addr: SocketAddr,
    ) -> (ConnectionDescriptor, broadcast::Receiver<()>) {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let descriptor = ConnectionDescriptor::new(id, addr);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        self.clients.insert(
            id,
            ClientInfo {
                descriptor,
                created: Instant::now(),
                shutdown_tx,
            },
        );
        self.stats.increment_total_connections();
        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
        metrics::CONNECTED_CLIENTS.set(self.clients.len() as f64);
        (descriptor, shutdown_rx)
    }

    /// Tears down a connection: its session entry and its registry entry are
    /// removed together under the dispatch lock, then observers are told.
    ///
    /// Safe to call more than once; only the call that actually removed the
    /// registry entry publishes. Returns whether this call did so.
    pub async fn close_connection(&self, connection: &ConnectionDescriptor) -> bool {
        let removed = {
            let mut dispatcher = self.dispatcher.lock().await;
            if dispatcher.end_session(connection) {
                debug!("Session for {} ended.", connection);
            }
            self.clients.remove(&connection.id).is_some()
        };
        if removed {
            metrics::CONNECTED_CLIENTS.set(self.clients.len() as f64);
            self.announce_close();
        }
        removed
    }

    fn announce_close(&self) {
        let delay = self.config.close_notify_delay();
        if delay.is_zero() {
            self.notifier.publish();
            return;
        }
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.publish();
        });
    }

    /// Signals every registered handler to stop and empties the registry.
    /// Returns how many handlers were signalled.
    pub fn disconnect_all(&self) -> usize {
        let mut signalled = 0;
        for entry in self.clients.iter() {
            if entry.value().shutdown_tx.send(()).is_ok() {
                signalled += 1;
            }
        }
        self.clients.clear();
        metrics::CONNECTED_CLIENTS.set(0.0);
        signalled
    }

    /// Stops a single connection, as if its peer had hung up.
    pub fn kill_connection(&self, id: u64) -> bool {
        match self.clients.get(&id) {
            Some(entry) => entry.value().shutdown_tx.send(()).is_ok(),
            None => false,
        }
    }

    /// The number of live connection handlers.
    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    pub fn open_connection_exists(&self) -> bool {
        !self.clients.is_empty()
    }

    /// The number of connections holding an authenticated session.
    pub fn authenticated_count(&self) -> usize {
        self.authenticated.load(Ordering::Acquire)
    }
}
