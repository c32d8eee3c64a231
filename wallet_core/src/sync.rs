//! Pulls account state from the transaction service into the state store.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tessera_service::{AccountData, Clock, ServiceError, TxService};
use tessera_store::StateStore;
use tessera_types::{Account, AccountId, TransactionRecord};
use tracing::{debug, info, warn};

use crate::error::WalletError;

/// Outcome of a sync that published a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub version: u64,
    /// Accounts whose data could not be fetched; their previous values were kept.
    pub degraded: Vec<AccountId>,
    pub rates_updated: bool,
}

pub struct SyncEngine {
    service: Arc<dyn TxService>,
    store: Arc<StateStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    running: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(service: Arc<dyn TxService>, store: Arc<StateStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            service,
            store,
            clock,
            timeout,
            running: tokio::sync::Mutex::new(()),
        }
    }

    /// Sync `accounts` of wallet `wallet_id`, giving up after the configured timeout.
    pub async fn sync(&self, wallet_id: &str, accounts: &[Account]) -> Result<SyncReport, WalletError> {
        match tokio::time::timeout(self.timeout, self.run(wallet_id, accounts)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "sync timed out");
                Err(WalletError::Sync {
                    code: ServiceError::NO_RESPONSE,
                    payload: "sync timed out".to_string(),
                })
            }
        }
    }

    /// Like [`sync`](Self::sync), abandoned as soon as `cancel` completes.
    /// A cancelled sync publishes nothing.
    pub async fn sync_until<C>(&self, wallet_id: &str, accounts: &[Account], cancel: C) -> Result<SyncReport, WalletError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.sync(wallet_id, accounts) => result,
            _ = cancel => {
                info!("sync cancelled");
                Err(WalletError::Cancelled)
            }
        }
    }

    async fn run(&self, wallet_id: &str, accounts: &[Account]) -> Result<SyncReport, WalletError> {
        let _running = self.running.lock().await;
        debug!(wallet_id, accounts = accounts.len(), "sync started");

        let mut fetched: Vec<(AccountId, AccountData)> = Vec::with_capacity(accounts.len());
        let mut failed: Vec<(AccountId, ServiceError)> = Vec::new();
        for account in accounts {
            match self.service.fetch_account(account).await {
                Ok(data) => fetched.push((account.id.clone(), data)),
                Err(err) => {
                    warn!(account = %account.id, code = err.code, "account sync failed");
                    failed.push((account.id.clone(), err));
                }
            }
        }
        if fetched.is_empty() {
            if let Some((_, err)) = failed.first() {
                return Err(err.clone().into());
            }
        }

        let rates = match self.service.fetch_exchange_rates().await {
            Ok(rates) => Some(rates),
            Err(err) => {
                warn!(code = err.code, "exchange rates unavailable, keeping previous");
                None
            }
        };

        let settings = match self.service.fetch_exchange_settings().await {
            Ok(settings) => Some(settings),
            Err(err) => {
                warn!(code = err.code, "exchange settings unavailable, keeping previous");
                None
            }
        };

        let now = self.clock.now();
        let degraded: Vec<AccountId> = failed.into_iter().map(|(id, _)| id).collect();
        let rates_updated = rates.is_some();
        let snapshot = self.store.try_update(|next| {
            if next.wallet_id.as_deref() != Some(wallet_id) {
                debug!(wallet_id, "wallet replaced during sync, discarding result");
                return Err(WalletError::Cancelled);
            }
            for (id, data) in fetched {
                let previous = next.transactions.remove(&id).unwrap_or_default();
                next.transactions.insert(id.clone(), merge_history(data.transactions, previous));
                next.balances.insert(id.clone(), data.balance);
                next.nonces.insert(id.clone(), data.nonce);
                next.utxos.insert(id.clone(), data.utxos);
                next.degraded.remove(&id);
            }
            next.degraded.extend(degraded.iter().cloned());
            if let Some(rates) = rates {
                next.exchange_rates = rates;
            }
            if let Some(settings) = settings {
                next.exchange_settings = settings;
            }
            next.synced_at = Some(now);
            Ok(())
        })?;

        info!(version = snapshot.version, degraded = degraded.len(), "sync finished");
        Ok(SyncReport {
            version: snapshot.version,
            degraded,
            rates_updated,
        })
    }
}

/// Service records win; locally submitted records the service has not seen
/// yet stay while they are pending. Newest first.
fn merge_history(fetched: Vec<TransactionRecord>, previous: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let known: HashSet<_> = fetched.iter().map(|tx| tx.hash).collect();
    let mut merged = fetched;
    merged.extend(
        previous
            .into_iter()
            .filter(|tx| tx.is_pending() && !known.contains(&tx.hash)),
    );
    merged.sort_by_key(|tx| Reverse(tx.timestamp()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_nullables::{NullClock, NullTxService};
    use tessera_types::{
        ChainType, Direction, ExchangeSetting, ExchangeSettings, Network, Timestamp, TransactionStatus, TxHash,
    };

    fn account(chain: ChainType, address: &str) -> Account {
        Account {
            id: AccountId::new(chain, Network::Mainnet, 0),
            chain,
            network: Network::Mainnet,
            address: address.to_string(),
            derivation_path: String::new(),
            index: 0,
        }
    }

    fn record(n: u8, status: TransactionStatus, at: u64) -> TransactionRecord {
        TransactionRecord {
            hash: TxHash::new([n; 32]),
            account_id: AccountId::new(ChainType::Ethereum, Network::Mainnet, 0),
            chain: ChainType::Ethereum,
            direction: Direction::Outgoing,
            status,
            from: "a".into(),
            to: "b".into(),
            amount: 1,
            fee: 1,
            nonce: None,
            submitted_at: Some(Timestamp::from_millis(at)),
            confirmed_at: None,
        }
    }

    fn setup() -> (Arc<NullTxService>, Arc<StateStore>, SyncEngine) {
        let service = Arc::new(NullTxService::new());
        let store = Arc::new(StateStore::new());
        store.update(|s| s.wallet_id = Some("w".into()));
        let engine = SyncEngine::new(
            service.clone(),
            store.clone(),
            Arc::new(NullClock::new(5_000)),
            Duration::from_secs(5),
        );
        (service, store, engine)
    }

    #[tokio::test]
    async fn publishes_balances() {
        let (service, store, engine) = setup();
        let eth = account(ChainType::Ethereum, "0xabc");
        service.set_account("0xabc", AccountData { balance: 42, nonce: 3, ..Default::default() });

        let report = engine.sync("w", &[eth.clone()]).await.unwrap();
        let snapshot = store.current();
        assert_eq!(report.version, snapshot.version);
        assert_eq!(snapshot.balance(&eth.id), 42);
        assert_eq!(snapshot.nonce(&eth.id), 3);
        assert_eq!(snapshot.synced_at, Some(Timestamp::from_millis(5_000)));
        assert!(!report.rates_updated);
    }

    #[tokio::test]
    async fn exchange_settings_follow_the_service() {
        let (service, store, engine) = setup();
        let setting = ExchangeSetting {
            id: "s1".into(),
            from: "ETH".into(),
            to: "BTC".into(),
            deposit_address: "0xdeposit".into(),
            min_exchange_amount: "0.1".into(),
            outgoing_fee_rate: "20".into(),
            exchange_fee_rate: "0.005".into(),
            return_fee: "0.0001".into(),
            timestamp: Timestamp::from_secs(1),
        };
        service.set_exchange_settings([setting].into_iter().collect());
        let eth = account(ChainType::Ethereum, "0xabc");
        engine.sync("w", &[eth.clone()]).await.unwrap();
        assert_eq!(store.current().exchange_settings.get("eth", "btc").unwrap().id, "s1");

        service.set_exchange_settings(ExchangeSettings::new());
        engine.sync("w", &[eth]).await.unwrap();
        assert!(store.current().exchange_settings.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_degrades_one_account() {
        let (service, store, engine) = setup();
        let eth = account(ChainType::Ethereum, "0xabc");
        let btc = account(ChainType::Bitcoin, "bc1q");
        service.set_account("0xabc", AccountData { balance: 1, ..Default::default() });
        service.set_account("bc1q", AccountData { balance: 2, ..Default::default() });
        engine.sync("w", &[eth.clone(), btc.clone()]).await.unwrap();

        service.set_account("0xabc", AccountData { balance: 10, ..Default::default() });
        service.fail_account("bc1q");
        let report = engine.sync("w", &[eth.clone(), btc.clone()]).await.unwrap();
        assert_eq!(report.degraded, vec![btc.id.clone()]);

        let snapshot = store.current();
        assert_eq!(snapshot.balance(&eth.id), 10);
        assert_eq!(snapshot.balance(&btc.id), 2);
        assert!(snapshot.is_degraded(&btc.id));

        service.restore_account("bc1q");
        engine.sync("w", &[eth, btc.clone()]).await.unwrap();
        assert!(!store.current().is_degraded(&btc.id));
    }

    #[tokio::test]
    async fn total_failure_is_sync_error() {
        let (service, store, engine) = setup();
        let eth = account(ChainType::Ethereum, "0xabc");
        service.fail_account("0xabc");
        let before = store.current().version;

        let err = engine.sync("w", &[eth]).await.unwrap_err();
        assert!(matches!(err, WalletError::Sync { code: 503, .. }));
        assert_eq!(store.current().version, before);
    }

    #[tokio::test]
    async fn total_failure_reports_first_account_error() {
        let (service, store, engine) = setup();
        let eth = account(ChainType::Ethereum, "0xabc");
        let btc = account(ChainType::Bitcoin, "bc1q");
        service.fail_account("0xabc");
        service.fail_account("bc1q");

        let err = engine.sync("w", &[eth, btc]).await.unwrap_err();
        assert!(matches!(err, WalletError::Sync { code: 503, .. }));
        assert!(store.current().degraded.is_empty());
    }

    #[tokio::test]
    async fn wallet_cleared_mid_sync_keeps_empty_snapshot() {
        let (service, store, engine) = setup();
        service.set_account("0x1", AccountData { balance: 9, ..Default::default() });
        service.set_latency(Duration::from_millis(50));
        let eth = account(ChainType::Ethereum, "0x1");

        let clearing = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.reset();
        };
        let accounts = [eth.clone()];
        let (result, _) = tokio::join!(engine.sync("w", &accounts), clearing);
        assert_eq!(result.unwrap_err(), WalletError::Cancelled);
        let snapshot = store.current();
        assert!(!snapshot.has_wallet());
        assert_eq!(snapshot.balance(&eth.id), 0);
    }

    #[tokio::test]
    async fn timeout_leaves_snapshot_alone() {
        let (service, store, _) = setup();
        service.set_latency(Duration::from_millis(200));
        let engine = SyncEngine::new(
            service.clone(),
            store.clone(),
            Arc::new(NullClock::new(0)),
            Duration::from_millis(20),
        );
        let before = store.current().version;
        let err = engine.sync("w", &[account(ChainType::Ethereum, "0x1")]).await.unwrap_err();
        assert_eq!(err.kind(), "sync_error");
        assert_eq!(store.current().version, before);
    }

    #[tokio::test]
    async fn cancelled_sync_publishes_nothing() {
        let (service, store, engine) = setup();
        service.set_latency(Duration::from_millis(200));
        let before = store.current().version;
        let err = engine
            .sync_until("w", &[account(ChainType::Ethereum, "0x1")], std::future::ready(()))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Cancelled);
        assert_eq!(store.current().version, before);
    }

    #[tokio::test]
    async fn replaced_wallet_discards_result() {
        let (_, store, engine) = setup();
        let err = engine.sync("other", &[account(ChainType::Ethereum, "0x1")]).await.unwrap_err();
        assert_eq!(err, WalletError::Cancelled);
        assert!(store.current().balances.is_empty());
    }

    #[test]
    fn local_pending_records_survive_until_indexed() {
        let fetched = vec![record(1, TransactionStatus::Confirmed, 10)];
        let previous = vec![
            record(1, TransactionStatus::Pending, 10),
            record(2, TransactionStatus::Pending, 20),
            record(3, TransactionStatus::Failed, 30),
        ];
        let merged = merge_history(fetched, previous);
        let hashes: Vec<u8> = merged.iter().map(|tx| tx.hash.as_bytes()[0]).collect();
        assert_eq!(hashes, vec![2, 1]);
        assert_eq!(merged[1].status, TransactionStatus::Confirmed);
    }
}
