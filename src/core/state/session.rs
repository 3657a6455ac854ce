// src/core/state/session.rs

use super::client::ConnectionDescriptor;
use crate::core::acl::Identity;
use crate::core::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Maps each authenticated connection to its identity.
///
/// Connections without an entry are unauthenticated. The table lives inside
/// the dispatcher and is only touched under the server-wide dispatch lock;
/// `live` mirrors its size for lock-free reads by observers.
#[derive(Debug, Default)]
pub struct SessionTable {
    entries: HashMap<ConnectionDescriptor, Arc<Identity>>,
    live: Arc<AtomicUsize>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `identity` to the connection, replacing any earlier one.
    pub fn insert(
        &mut self,
        connection: ConnectionDescriptor,
        identity: Arc<Identity>,
    ) -> Option<Arc<Identity>> {
        let previous = self.entries.insert(connection, identity);
        self.sync_count();
        previous
    }

    pub fn remove(&mut self, connection: &ConnectionDescriptor) -> Option<Arc<Identity>> {
        let removed = self.entries.remove(connection);
        if removed.is_some() {
            self.sync_count();
        }
        removed
    }

    pub fn get(&self, connection: &ConnectionDescriptor) -> Option<&Identity> {
        self.entries.get(connection).map(|identity| identity.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A shared counter that always holds the number of entries.
    pub fn live_count(&self) -> Arc<AtomicUsize> {
        self.live.clone()
    }

    fn sync_count(&self) {
        let len = self.entries.len();
        self.live.store(len, Ordering::Release);
        metrics::AUTHENTICATED_SESSIONS.set(len as f64);
    }
}
