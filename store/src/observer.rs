//! Subscriber registry for snapshot notifications.
//!
//! The registry never owns an observer: it keeps a `Weak` handle per
//! subscription, keyed by an increasing id so iteration follows registration
//! order. A subscription ends when its [`Subscription`] guard is dropped or
//! explicitly cancelled, or when the observer itself is dropped; dead handles
//! are pruned on the next notification.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

use crate::StateSnapshot;

/// Receives every snapshot published after it subscribed.
///
/// Called on the publishing thread after the new snapshot is visible to
/// readers. Implementations must not publish from inside the callback.
pub trait SnapshotObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &Arc<StateSnapshot>);
}

impl<F> SnapshotObserver for F
where
    F: Fn(&Arc<StateSnapshot>) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: &Arc<StateSnapshot>) {
        self(snapshot)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: BTreeMap<SubscriptionId, Weak<dyn SnapshotObserver>>,
}

#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: &Arc<dyn SnapshotObserver>) -> Subscription {
        let mut registry = lock(&self.inner);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.observers.insert(id, Arc::downgrade(observer));
        debug!(subscription = id.0, "observer subscribed");
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Returns false if `id` was not (or no longer) registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove(&self.inner, id)
    }

    /// Deliver `snapshot` to every live observer in registration order.
    ///
    /// The registry lock is released before any callback runs, so observers
    /// may subscribe or unsubscribe from inside `on_snapshot`.
    pub fn notify(&self, snapshot: &Arc<StateSnapshot>) -> usize {
        let live: Vec<Arc<dyn SnapshotObserver>> = {
            let mut registry = lock(&self.inner);
            let before = registry.observers.len();
            let mut live = Vec::with_capacity(before);
            registry.observers.retain(|_, weak| match weak.upgrade() {
                Some(observer) => {
                    live.push(observer);
                    true
                }
                None => false,
            });
            let pruned = before - registry.observers.len();
            if pruned > 0 {
                debug!(pruned, "pruned dropped observers");
            }
            live
        };
        for observer in &live {
            observer.on_snapshot(snapshot);
        }
        live.len()
    }

    /// Registered handles, including any whose observer has been dropped
    /// since the last notification.
    pub fn len(&self) -> usize {
        lock(&self.inner).observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard for one registration; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            remove(&registry, self.id);
        }
    }
}

fn lock(inner: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove(inner: &Mutex<Registry>, id: SubscriptionId) -> bool {
    let removed = lock(inner).observers.remove(&id).is_some();
    if removed {
        debug!(subscription = id.0, "observer unsubscribed");
    }
    removed
}
