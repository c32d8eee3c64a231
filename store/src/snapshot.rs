//! The immutable wallet view read by every query.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tessera_types::{
    Account, AccountId, ChainType, ExchangeRates, ExchangeSettings, Network, Timestamp, TransactionRecord, Utxo,
};

/// Point-in-time view of accounts, balances, history and rates.
///
/// Balances are in the account chain's base unit. Accounts listed in
/// `degraded` failed to refresh during the last sync and still carry the data
/// of an earlier one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Increases by one with every published snapshot.
    pub version: u64,
    /// Id of the keystore the accounts belong to, if one is loaded.
    pub wallet_id: Option<String>,
    pub accounts: Vec<Account>,
    pub balances: BTreeMap<AccountId, u128>,
    pub nonces: BTreeMap<AccountId, u64>,
    pub utxos: BTreeMap<AccountId, Vec<Utxo>>,
    pub transactions: BTreeMap<AccountId, Vec<TransactionRecord>>,
    pub exchange_rates: ExchangeRates,
    #[serde(default)]
    pub exchange_settings: ExchangeSettings,
    pub degraded: BTreeSet<AccountId>,
    pub synced_at: Option<Timestamp>,
}

impl StateSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.id == id)
    }

    /// First account for `chain` on `network`.
    pub fn get_account(&self, chain: ChainType, network: Network) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.chain == chain && a.network == network)
    }

    /// Ethereum addresses compare case-insensitively, Bitcoin ones exactly.
    pub fn account_by_address(&self, address: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| match a.chain {
            ChainType::Ethereum => a.address.eq_ignore_ascii_case(address),
            ChainType::Bitcoin => a.address == address,
        })
    }

    pub fn balance(&self, id: &AccountId) -> u128 {
        self.balances.get(id).copied().unwrap_or(0)
    }

    pub fn nonce(&self, id: &AccountId) -> u64 {
        self.nonces.get(id).copied().unwrap_or(0)
    }

    pub fn utxos(&self, id: &AccountId) -> &[Utxo] {
        self.utxos.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn transactions(&self, id: &AccountId) -> &[TransactionRecord] {
        self.transactions.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_degraded(&self, id: &AccountId) -> bool {
        self.degraded.contains(id)
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet_id.is_some()
    }
}
