// src/core/events.rs

//! The change notifier: tells local observers that connection, session or
//! playback state may have changed.
//!
//! Notifications carry no payload. Observers re-read whatever they display
//! (connection counts, player state) through `ServerState`.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Something interested in "state may have changed" signals.
///
/// Called synchronously on the publishing task; implementations must return
/// quickly and must not wait on the dispatch lock.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self);
}

impl<F> ChangeObserver for F
where
    F: Fn() + Send + Sync,
{
    fn on_change(&self) {
        self()
    }
}

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out of change signals to every subscribed observer.
#[derive(Default)]
pub struct ChangeNotifier {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn ChangeObserver>)>>,
    next_id: AtomicU64,
    published: AtomicU64,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observers.read().len())
            .field("published", &self.published_count())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn ChangeObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Signals every observer once.
    pub fn publish(&self) {
        // Observers run outside the lock so they may (un)subscribe themselves.
        let observers: Vec<Arc<dyn ChangeObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        self.published.fetch_add(1, Ordering::Relaxed);
        trace!("Publishing change to {} observer(s).", observers.len());
        for observer in observers {
            observer.on_change();
        }
    }

    /// How many times `publish` has run since startup.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}
