//! Per-account nonce assignment for account-model chains.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tessera_types::AccountId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out nonces so that concurrent sends from one account never collide.
///
/// Each account has its own async lock; holding a [`NonceLease`] serialises
/// nonce assignment for that account only.
#[derive(Default)]
pub struct NonceTracker {
    slots: Mutex<HashMap<AccountId, Arc<AsyncMutex<u64>>>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lease(&self, id: &AccountId) -> NonceLease {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(id.clone()).or_default())
        };
        NonceLease {
            next: slot.lock_owned().await,
        }
    }

    /// Forget every tracked nonce.
    pub fn reset(&self) {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Exclusive access to one account's next nonce.
pub struct NonceLease {
    next: OwnedMutexGuard<u64>,
}

impl NonceLease {
    /// The nonce to use next, given the network's view of the account.
    pub fn next(&self, network_nonce: u64) -> u64 {
        (*self.next).max(network_nonce)
    }

    pub fn consume(&mut self, nonce: u64) {
        *self.next = (*self.next).max(nonce.saturating_add(1));
    }

    /// Give `nonce` back after the network explicitly refused it. Only the
    /// most recently consumed nonce can be returned.
    pub fn release(&mut self, nonce: u64) {
        if *self.next == nonce.saturating_add(1) {
            *self.next = nonce;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_types::{ChainType, Network};

    fn id() -> AccountId {
        AccountId::new(ChainType::Ethereum, Network::Mainnet, 0)
    }

    #[tokio::test]
    async fn consumed_nonces_are_not_reused() {
        let tracker = NonceTracker::new();
        let mut lease = tracker.lease(&id()).await;
        assert_eq!(lease.next(4), 4);
        lease.consume(4);
        drop(lease);

        let lease = tracker.lease(&id()).await;
        assert_eq!(lease.next(4), 5);
        assert_eq!(lease.next(9), 9);
    }

    #[tokio::test]
    async fn release_returns_only_latest() {
        let tracker = NonceTracker::new();
        let mut lease = tracker.lease(&id()).await;
        lease.consume(0);
        lease.consume(1);
        lease.release(0);
        assert_eq!(lease.next(0), 2);
        lease.release(1);
        assert_eq!(lease.next(0), 1);
    }

    #[tokio::test]
    async fn concurrent_leases_serialise() {
        let tracker = Arc::new(NonceTracker::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                let mut lease = tracker.lease(&id()).await;
                let nonce = lease.next(0);
                tokio::task::yield_now().await;
                lease.consume(nonce);
                nonce
            }));
        }
        let mut nonces = Vec::new();
        for handle in handles {
            nonces.push(handle.await.unwrap());
        }
        nonces.sort_unstable();
        assert_eq!(nonces, (0..16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn reset_forgets() {
        let tracker = NonceTracker::new();
        tracker.lease(&id()).await.consume(7);
        tracker.reset();
        assert_eq!(tracker.lease(&id()).await.next(0), 0);
    }
}
