//! Wallet state for the tessera engine.
//!
//! There is exactly one current [`StateSnapshot`]. Writers build the next
//! snapshot off to the side and swap it in as a whole, so readers only ever
//! see complete snapshots. Every swap is announced to the live subscribers of
//! the [`ObserverRegistry`].

pub mod observer;
pub mod snapshot;
pub mod state;

pub use observer::{ObserverRegistry, SnapshotObserver, Subscription, SubscriptionId};
pub use snapshot::StateSnapshot;
pub use state::StateStore;
