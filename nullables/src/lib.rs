//! Nullable infrastructure for deterministic testing.
//!
//! The engine reaches the outside world only through the traits in
//! `tessera-service`. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod tx_service;

pub use clock::NullClock;
pub use tx_service::NullTxService;
