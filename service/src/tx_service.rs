//! The remote transaction-indexing service contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tessera_types::{
    Account, ChainType, ExchangeRates, ExchangeSettings, FeeRates, HistoricalExchangeRates, TransactionRecord, Utxo,
};

use crate::ServiceError;

/// Everything the service knows about one account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    /// Base units of the account's chain.
    pub balance: u128,
    /// Next nonce expected by the network; always 0 for UTXO chains.
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub utxos: Vec<Utxo>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

/// The service's verdict on a broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastAck {
    pub accepted: bool,
    #[serde(default)]
    pub hash: Option<String>,
    /// Why the network or service refused the transaction.
    #[serde(default)]
    pub reason: Option<String>,
}

impl BroadcastAck {
    pub fn accepted(hash: impl Into<String>) -> Self {
        Self {
            accepted: true,
            hash: Some(hash.into()),
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            hash: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub user_id: String,
    pub has_wallet: bool,
}

#[async_trait]
pub trait TxService: Send + Sync {
    async fn fetch_account(&self, account: &Account) -> Result<AccountData, ServiceError>;

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, ServiceError>;

    async fn fetch_exchange_settings(&self) -> Result<ExchangeSettings, ServiceError>;

    async fn fetch_historical_exchange_rates(&self) -> Result<HistoricalExchangeRates, ServiceError>;

    async fn fetch_fee_rates(&self, chain: ChainType) -> Result<FeeRates, ServiceError>;

    /// Submit a signed transaction. `Err` means the outcome is unknown;
    /// an explicit refusal comes back as `Ok` with `accepted == false`.
    async fn broadcast(&self, chain: ChainType, raw_hex: &str) -> Result<BroadcastAck, ServiceError>;

    async fn authenticate(
        &self,
        token: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<AuthResult, ServiceError>;
}
