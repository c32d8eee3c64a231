//! Nullable transaction service: scripted responses and recorded broadcasts.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tessera_service::{AccountData, AuthResult, BroadcastAck, ServiceError, TxService};
use tessera_types::{Account, ChainType, ExchangeRates, ExchangeSettings, FeeRates, HistoricalExchangeRates};

/// An in-memory transaction service for testing.
///
/// Accounts are keyed by address. Unknown addresses report an empty account.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullTxService {
    accounts: Mutex<HashMap<String, AccountData>>,
    failing: Mutex<HashSet<String>>,
    rates: Mutex<Option<ExchangeRates>>,
    settings: Mutex<Option<ExchangeSettings>>,
    history: Mutex<HistoricalExchangeRates>,
    fee_rates: Mutex<HashMap<ChainType, FeeRates>>,
    broadcast_replies: Mutex<VecDeque<Result<BroadcastAck, ServiceError>>>,
    broadcasts: Mutex<Vec<(ChainType, String)>>,
    tokens: Mutex<HashMap<String, AuthResult>>,
    latency: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl NullTxService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account(&self, address: &str, data: AccountData) {
        self.accounts.lock().unwrap().insert(address.to_string(), data);
    }

    /// Make every fetch for `address` fail with a 503.
    pub fn fail_account(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn restore_account(&self, address: &str) {
        self.failing.lock().unwrap().remove(address);
    }

    /// Without rates set, fetching them fails with a 404.
    pub fn set_exchange_rates(&self, rates: ExchangeRates) {
        *self.rates.lock().unwrap() = Some(rates);
    }

    /// Without settings set, fetching them fails with a 404.
    pub fn set_exchange_settings(&self, settings: ExchangeSettings) {
        *self.settings.lock().unwrap() = Some(settings);
    }

    pub fn set_historical_exchange_rates(&self, history: HistoricalExchangeRates) {
        *self.history.lock().unwrap() = history;
    }

    pub fn set_fee_rates(&self, chain: ChainType, rates: FeeRates) {
        self.fee_rates.lock().unwrap().insert(chain, rates);
    }

    /// Queue the reply for the next broadcast. With nothing queued,
    /// broadcasts are accepted.
    pub fn push_broadcast_reply(&self, reply: Result<BroadcastAck, ServiceError>) {
        self.broadcast_replies.lock().unwrap().push_back(reply);
    }

    pub fn add_token(&self, token: &str, result: AuthResult) {
        self.tokens.lock().unwrap().insert(token.to_string(), result);
    }

    /// Delay every call by `latency` (for timeout and cancellation tests).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// All raw transactions "sent", in order.
    pub fn broadcasts(&self) -> Vec<(ChainType, String)> {
        self.broadcasts.lock().unwrap().clone()
    }

    /// Number of `fetch_account` calls served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl TxService for NullTxService {
    async fn fetch_account(&self, account: &Account) -> Result<AccountData, ServiceError> {
        self.simulate_latency().await;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&account.address) {
            return Err(ServiceError::new(503, format!("{} unavailable", account.id)));
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&account.address)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, ServiceError> {
        self.simulate_latency().await;
        self.rates
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ServiceError::new(404, "no exchange rates"))
    }

    async fn fetch_exchange_settings(&self) -> Result<ExchangeSettings, ServiceError> {
        self.simulate_latency().await;
        self.settings
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ServiceError::new(404, "no exchange settings"))
    }

    async fn fetch_historical_exchange_rates(&self) -> Result<HistoricalExchangeRates, ServiceError> {
        self.simulate_latency().await;
        Ok(self.history.lock().unwrap().clone())
    }

    async fn fetch_fee_rates(&self, chain: ChainType) -> Result<FeeRates, ServiceError> {
        self.simulate_latency().await;
        self.fee_rates
            .lock()
            .unwrap()
            .get(&chain)
            .cloned()
            .ok_or_else(|| ServiceError::new(404, format!("no fee rates for {chain}")))
    }

    async fn broadcast(&self, chain: ChainType, raw_hex: &str) -> Result<BroadcastAck, ServiceError> {
        self.simulate_latency().await;
        self.broadcasts
            .lock()
            .unwrap()
            .push((chain, raw_hex.to_string()));
        self.broadcast_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(BroadcastAck {
                accepted: true,
                hash: None,
                reason: None,
            }))
    }

    async fn authenticate(
        &self,
        token: &str,
        _headers: &BTreeMap<String, String>,
    ) -> Result<AuthResult, ServiceError> {
        self.simulate_latency().await;
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::new(401, "invalid token"))
    }
}
