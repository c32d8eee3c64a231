//! The single authoritative snapshot holder.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

use crate::{ObserverRegistry, SnapshotObserver, StateSnapshot, Subscription};

/// Holds the current snapshot behind an `Arc` swap.
///
/// Reads clone the `Arc` under a short read lock and never wait on network
/// work. Writes are serialised by a publish lock that also covers observer
/// notification, so every subscriber sees snapshots in publication order.
pub struct StateStore {
    current: RwLock<Arc<StateSnapshot>>,
    publish: Mutex<()>,
    observers: ObserverRegistry,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(StateSnapshot::empty())),
            publish: Mutex::new(()),
            observers: ObserverRegistry::new(),
        }
    }

    pub fn current(&self) -> Arc<StateSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Build the next snapshot from a copy of the current one and publish it.
    pub fn update<F>(&self, apply: F) -> Arc<StateSnapshot>
    where
        F: FnOnce(&mut StateSnapshot),
    {
        let _publishing = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.current();
        let mut next = StateSnapshot::clone(&previous);
        apply(&mut next);
        next.version = previous.version + 1;
        self.swap(next)
    }

    /// Like [`update`](Self::update), but publishes nothing when `apply` fails.
    /// The check and the write happen under the same publish lock.
    pub fn try_update<F, E>(&self, apply: F) -> Result<Arc<StateSnapshot>, E>
    where
        F: FnOnce(&mut StateSnapshot) -> Result<(), E>,
    {
        let _publishing = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.current();
        let mut next = StateSnapshot::clone(&previous);
        apply(&mut next)?;
        next.version = previous.version + 1;
        Ok(self.swap(next))
    }

    /// Publish an empty snapshot, keeping the version sequence.
    pub fn reset(&self) -> Arc<StateSnapshot> {
        self.update(|next| *next = StateSnapshot::empty())
    }

    fn swap(&self, next: StateSnapshot) -> Arc<StateSnapshot> {
        let next = Arc::new(next);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        let delivered = self.observers.notify(&next);
        debug!(version = next.version, delivered, "published snapshot");
        next
    }

    pub fn subscribe(&self, observer: &Arc<dyn SnapshotObserver>) -> Subscription {
        self.observers.subscribe(observer)
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
