// src/core/state/client.rs

//! Contains state definitions related to client connections.

use dashmap::DashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// The identity of one TCP connection for as long as it lives.
///
/// Ids are assigned sequentially by the acceptor and never reused within a
/// process, so two descriptors are equal only for the same connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionDescriptor {
    pub id: u64,
    pub addr: SocketAddr,
}

impl ConnectionDescriptor {
    pub fn new(id: u64, addr: SocketAddr) -> Self {
        Self { id, addr }
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.id, self.addr)
    }
}

pub type ShutdownSender = broadcast::Sender<()>;

/// A live connection in the registry.
#[derive(Debug)]
pub struct ClientInfo {
    pub descriptor: ConnectionDescriptor,
    pub created: Instant,
    /// Fires to cancel just this connection's handler.
    pub shutdown_tx: ShutdownSender,
}

/// Every live connection handler, keyed by connection id.
pub type ClientMap = Arc<DashMap<u64, ClientInfo>>;
