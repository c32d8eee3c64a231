//! Interfaces to the outside world used by the wallet engine.
//!
//! The engine depends only on these traits. `tessera-wallet-core` provides
//! the HTTP implementation; `tessera-nullables` provides deterministic
//! in-memory ones for tests.

pub mod clock;
pub mod error;
pub mod tx_service;

pub use clock::{Clock, SystemClock};
pub use error::ServiceError;
pub use tx_service::{AccountData, AuthResult, BroadcastAck, TxService};
