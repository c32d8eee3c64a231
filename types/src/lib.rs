//! Fundamental value types for the tessera wallet engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! chain and network identifiers, accounts, amounts and unit conversion,
//! transaction history records, unspent outputs, exchange and fee rates.

pub mod account;
pub mod amount;
pub mod chain;
pub mod error;
pub mod hash;
pub mod rates;
pub mod time;
pub mod transaction;
pub mod units;
pub mod utxo;

pub use account::{Account, AccountId};
pub use amount::{Satoshi, Wei};
pub use chain::{ChainType, LedgerModel, Network};
pub use error::TypesError;
pub use hash::TxHash;
pub use rates::{
    ExchangeRate, ExchangeRates, ExchangeSetting, ExchangeSettings, FeeRates, FeeSpeed, HistoricalExchangeRates,
    TimeInterval,
};
pub use time::Timestamp;
pub use transaction::{Direction, TransactionRecord, TransactionStatus};
pub use utxo::Utxo;
