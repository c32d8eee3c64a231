//! Wallet engine for tessera.
//!
//! Provides everything a wallet application needs:
//! - Encrypted keystore and its lock/unlock lifecycle
//! - Account derivation for Ethereum and Bitcoin
//! - Transaction composition, signing and broadcast
//! - Fee and maximum-spendable estimation
//! - Sync against the remote transaction service
//! - Observable state snapshots

pub mod config;
pub mod engine;
pub mod error;
pub mod keystore;
pub mod keystore_manager;
pub mod nonce;
pub mod sync;
pub mod tx_service;
pub mod units;

use std::sync::OnceLock;

pub use config::EngineConfig;
pub use engine::{BtcSendRequest, ComposedTransaction, EthSendRequest, SendAmount, WalletEngine};
pub use error::WalletError;
pub use keystore::{
    decrypt_keystore, encrypt_keystore, load_keystore, save_keystore, KdfParams, KeystoreFile, KeystoreStorage,
};
pub use keystore_manager::{KeystoreManager, KeystoreState};
pub use sync::SyncReport;
pub use tx_service::HttpTxService;

pub use tessera_service::{AuthResult, TxService};
pub use tessera_store::{SnapshotObserver, StateSnapshot, Subscription};

static ENGINE: OnceLock<WalletEngine> = OnceLock::new();

/// Create the process-wide engine. Later calls return the existing engine
/// and ignore their `config`.
pub fn initialize(config: EngineConfig) -> Result<&'static WalletEngine, WalletError> {
    if let Some(engine) = ENGINE.get() {
        return Ok(engine);
    }
    let engine = WalletEngine::new(config)?;
    if ENGINE.set(engine).is_err() {
        tracing::debug!("engine initialised concurrently, keeping the first");
    }
    ENGINE.get().ok_or(WalletError::NotInitialized)
}

/// The engine created by [`initialize`].
pub fn engine() -> Result<&'static WalletEngine, WalletError> {
    ENGINE.get().ok_or(WalletError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let first = initialize(EngineConfig::default()).unwrap();
        let second = initialize(EngineConfig {
            api_key: "ignored".into(),
            ..EngineConfig::default()
        })
        .unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.config().api_key, "");
        assert!(std::ptr::eq(engine().unwrap(), first));
    }
}
