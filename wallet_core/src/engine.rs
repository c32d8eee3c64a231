//! The wallet engine: one keystore session, one state store, one sync loop.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tessera_crypto::{generate_mnemonic, is_valid_word_count, validate_mnemonic};
use tessera_service::{AuthResult, Clock, SystemClock, TxService};
use tessera_store::{SnapshotObserver, StateSnapshot, StateStore, Subscription};
use tessera_transactions::btc::{recipient_script, DUST_THRESHOLD};
use tessera_transactions::eth::parse_data;
use tessera_transactions::{
    build_btc_transaction, build_eth_transaction, max_spend_btc, max_spendable_eth, BtcTransactionParams,
    EthTransactionParams, SignedTransaction, UnsignedTransaction,
};
use tessera_types::{
    Account, AccountId, ChainType, Direction, ExchangeRates, ExchangeSetting, FeeRates, HistoricalExchangeRates,
    Network, Satoshi, TransactionRecord, TransactionStatus, TxHash, Utxo, Wei,
};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::config::EngineConfig;
use crate::error::WalletError;
use crate::keystore::KeystoreStorage;
use crate::keystore_manager::{KeystoreManager, KeystoreState};
use crate::nonce::{NonceLease, NonceTracker};
use crate::sync::{SyncEngine, SyncReport};
use crate::tx_service::HttpTxService;
use crate::units::parse_integer;

/// How much to send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendAmount {
    /// Base units of the sending chain.
    Exact(u128),
    /// Everything left after the fee.
    Max,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthSendRequest {
    pub account_id: AccountId,
    pub to: String,
    pub amount: SendAmount,
    /// Wei per unit of gas.
    pub gas_price: Wei,
    pub gas_limit: u64,
    /// Hex call data, with or without `0x`.
    pub data: Option<String>,
    /// Overrides the tracked nonce.
    pub nonce: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BtcSendRequest {
    pub account_id: AccountId,
    pub to: String,
    pub amount: SendAmount,
    /// Satoshi per virtual byte.
    pub fee_rate: u64,
    /// Receives the change; defaults to the sending account.
    pub change_account_id: Option<AccountId>,
}

/// A signed transaction that has not been broadcast yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedTransaction {
    pub account_id: AccountId,
    pub chain: ChainType,
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub fee: u128,
    pub nonce: Option<u64>,
    pub raw_hex: String,
    pub hash: TxHash,
    /// Outputs consumed by a UTXO transaction.
    pub spent: Vec<Utxo>,
    /// The change output and the account receiving it, if any.
    pub change: Option<(AccountId, Utxo)>,
}

impl ComposedTransaction {
    fn from_signed(signed: &SignedTransaction) -> Self {
        let tx = &signed.unsigned;
        let (spent, change) = match tx {
            UnsignedTransaction::Btc(btc) => {
                let change = (!btc.change.is_zero()).then(|| {
                    let output = Utxo {
                        txid: signed.hash,
                        vout: 1,
                        value: btc.change,
                        confirmations: 0,
                    };
                    (btc.change_account_id.clone(), output)
                });
                (btc.inputs.clone(), change)
            }
            UnsignedTransaction::Eth(_) => (Vec::new(), None),
        };
        Self {
            account_id: tx.account_id().clone(),
            chain: tx.chain(),
            from: tx.from_address().to_string(),
            to: tx.to_address(),
            amount: tx.value(),
            fee: tx.fee(),
            nonce: tx.nonce(),
            raw_hex: signed.raw_hex(),
            hash: signed.hash,
            spent,
            change,
        }
    }

    /// Hash formatted for the chain's explorers.
    pub fn hash_string(&self) -> String {
        match self.chain {
            ChainType::Ethereum => self.hash.to_prefixed(),
            ChainType::Bitcoin => self.hash.to_string(),
        }
    }
}

pub struct WalletEngine {
    config: EngineConfig,
    service: Arc<dyn TxService>,
    clock: Arc<dyn Clock>,
    store: Arc<StateStore>,
    keystore: Arc<tokio::sync::Mutex<KeystoreManager>>,
    nonces: NonceTracker,
    sync: SyncEngine,
    session: Mutex<Option<AuthResult>>,
}

impl WalletEngine {
    /// An engine talking to the HTTP transaction service named in `config`.
    pub fn new(config: EngineConfig) -> Result<Self, WalletError> {
        let service = Arc::new(HttpTxService::new(&config)?);
        Self::with_service(config, service, Arc::new(SystemClock))
    }

    pub fn with_service(
        config: EngineConfig,
        service: Arc<dyn TxService>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WalletError> {
        let storage = match config.keystore_path() {
            Some(path) => KeystoreStorage::File(path),
            None => KeystoreStorage::Memory,
        };
        let manager = KeystoreManager::open(storage, config.network, config.kdf.clone())?;

        let store = Arc::new(StateStore::new());
        if let Some(id) = manager.keystore_id() {
            let id = id.to_string();
            store.update(|next| next.wallet_id = Some(id));
        }

        let sync = SyncEngine::new(
            Arc::clone(&service),
            Arc::clone(&store),
            Arc::clone(&clock),
            config.sync_timeout(),
        );
        info!(network = %config.network, service = %config.tx_service_url, "wallet engine ready");
        Ok(Self {
            config,
            service,
            clock,
            store,
            keystore: Arc::new(tokio::sync::Mutex::new(manager)),
            nonces: NonceTracker::new(),
            sync,
            session: Mutex::new(None),
        })
    }

    /// Run `work` on the blocking pool with exclusive access to the keystore.
    /// Key stretching, seed derivation and signing all happen in here.
    async fn with_keystore<T, F>(&self, work: F) -> Result<T, WalletError>
    where
        T: Send + 'static,
        F: FnOnce(&mut KeystoreManager) -> Result<T, WalletError> + Send + 'static,
    {
        let mut keystore = Arc::clone(&self.keystore).lock_owned().await;
        match tokio::task::spawn_blocking(move || work(&mut keystore)).await {
            Ok(result) => result,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    // ── Authentication ──────────────────────────────────────────────────

    pub async fn authenticate(
        &self,
        token: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<AuthResult, WalletError> {
        let result = self
            .service
            .authenticate(token, headers)
            .await
            .map_err(|err| if err.is_unauthorized() { WalletError::Authentication } else { err.into() })?;
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
        Ok(result)
    }

    /// The user of the last successful [`authenticate`](Self::authenticate).
    pub fn current_user(&self) -> Option<AuthResult> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// End the session: forget the user, lock the keystore and publish an
    /// empty snapshot. The keystore itself is kept.
    pub async fn sign_out(&self) {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.keystore.lock().await.lock();
        self.nonces.reset();
        self.store.reset();
        info!("signed out");
    }

    // ── Wallet lifecycle ────────────────────────────────────────────────

    pub fn generate_mnemonic(word_count: usize) -> Result<Zeroizing<String>, WalletError> {
        if !is_valid_word_count(word_count) {
            return Err(WalletError::InvalidParameter(format!("invalid word count {word_count}")));
        }
        Ok(generate_mnemonic(word_count)?)
    }

    /// True if `candidate` is a valid, checksummed mnemonic. Never fails.
    pub fn is_recovery_mnemonic(candidate: &str) -> bool {
        validate_mnemonic(candidate)
    }

    pub async fn state(&self) -> KeystoreState {
        self.keystore.lock().await.state()
    }

    /// Create a wallet from a freshly generated mnemonic and unlock it.
    pub async fn create_wallet(
        &self,
        mnemonic: &str,
        passphrase: Option<&str>,
        password: &str,
    ) -> Result<Arc<StateSnapshot>, WalletError> {
        let mnemonic = Zeroizing::new(mnemonic.to_string());
        let passphrase = passphrase.map(|p| Zeroizing::new(p.to_string()));
        let password = Zeroizing::new(password.to_string());
        let now = self.clock.now();
        let store = Arc::clone(&self.store);
        let snapshot = self
            .with_keystore(move |keystore| {
                let accounts = keystore.create(&mnemonic, passphrase.as_deref().map(String::as_str), &password, now)?;
                let wallet_id = keystore.keystore_id().map(str::to_string);
                Ok(store.update(|next| {
                    *next = StateSnapshot::empty();
                    next.wallet_id = wallet_id;
                    next.accounts = accounts;
                }))
            })
            .await?;
        self.nonces.reset();
        Ok(snapshot)
    }

    /// Replace any existing wallet with one restored from `mnemonic`.
    pub async fn recover_wallet(
        &self,
        mnemonic: &str,
        passphrase: Option<&str>,
        password: &str,
    ) -> Result<Arc<StateSnapshot>, WalletError> {
        if !validate_mnemonic(mnemonic) {
            return Err(WalletError::InvalidParameter("invalid recovery mnemonic".to_string()));
        }
        info!("recovering wallet from mnemonic");
        self.create_wallet(mnemonic, passphrase, password).await
    }

    pub async fn unlock_wallet(&self, password: &str) -> Result<Arc<StateSnapshot>, WalletError> {
        let password = Zeroizing::new(password.to_string());
        let store = Arc::clone(&self.store);
        self.with_keystore(move |keystore| {
            let accounts = keystore.unlock(&password)?;
            let wallet_id = keystore.keystore_id().map(str::to_string);
            Ok(store.update(|next| {
                if next.wallet_id != wallet_id {
                    *next = StateSnapshot::empty();
                    next.wallet_id = wallet_id;
                }
                next.accounts = accounts;
            }))
        })
        .await
    }

    pub async fn reveal_mnemonic(&self, password: &str) -> Result<Zeroizing<String>, WalletError> {
        let password = Zeroizing::new(password.to_string());
        self.with_keystore(move |keystore| keystore.reveal_mnemonic(&password)).await
    }

    /// Forget the decrypted seed; the keystore stays and can be unlocked again.
    pub async fn lock(&self) {
        self.keystore.lock().await.lock();
    }

    /// Destroy the keystore and publish an empty snapshot. Idempotent.
    pub async fn clear(&self) -> Result<(), WalletError> {
        let store = Arc::clone(&self.store);
        self.with_keystore(move |keystore| {
            keystore.clear()?;
            store.reset();
            Ok(())
        })
        .await?;
        self.nonces.reset();
        Ok(())
    }

    // ── Sync ────────────────────────────────────────────────────────────

    pub async fn sync(&self) -> Result<SyncReport, WalletError> {
        let (wallet_id, accounts) = self.sync_target().await?;
        self.sync.sync(&wallet_id, &accounts).await
    }

    /// Sync, abandoning the attempt when `cancel` completes.
    pub async fn sync_until<C>(&self, cancel: C) -> Result<SyncReport, WalletError>
    where
        C: Future<Output = ()>,
    {
        let (wallet_id, accounts) = self.sync_target().await?;
        self.sync.sync_until(&wallet_id, &accounts, cancel).await
    }

    async fn sync_target(&self) -> Result<(String, Vec<Account>), WalletError> {
        let keystore = self.keystore.lock().await;
        let accounts = keystore.accounts()?.to_vec();
        let wallet_id = keystore.keystore_id().ok_or(WalletError::NotUnlocked)?.to_string();
        Ok((wallet_id, accounts))
    }

    // ── Transactions ────────────────────────────────────────────────────

    pub async fn compose_eth_transaction(&self, request: &EthSendRequest) -> Result<ComposedTransaction, WalletError> {
        let mut lease = self.nonces.lease(&request.account_id).await;
        self.compose_eth(request, &mut lease).await
    }

    async fn compose_eth(
        &self,
        request: &EthSendRequest,
        lease: &mut NonceLease,
    ) -> Result<ComposedTransaction, WalletError> {
        let snapshot = self.store.current();
        let nonce = request
            .nonce
            .unwrap_or_else(|| lease.next(snapshot.nonce(&request.account_id)));
        let request = request.clone();

        let composed = self
            .with_keystore(move |keystore| {
                let account = keystore.account(&request.account_id)?;
                if account.chain != ChainType::Ethereum {
                    return Err(WalletError::InvalidParameter(format!("{} is not an ethereum account", account.id)));
                }

                let balance = Wei::new(snapshot.balance(&account.id));
                let value = match request.amount {
                    SendAmount::Exact(value) => Wei::new(value),
                    SendAmount::Max => max_spendable_eth(balance, request.gas_price, request.gas_limit),
                };
                let data = match &request.data {
                    Some(hex) => parse_data(hex)?,
                    None => Vec::new(),
                };

                let unsigned = build_eth_transaction(
                    account,
                    balance,
                    EthTransactionParams {
                        to: request.to.clone(),
                        value,
                        gas_price: request.gas_price,
                        gas_limit: request.gas_limit,
                        nonce,
                        data,
                    },
                )?;
                let signed = keystore.with_private_key(&account.id, |key| Ok(unsigned.sign(key)?))?;
                Ok(ComposedTransaction::from_signed(&signed))
            })
            .await?;
        lease.consume(nonce);
        Ok(composed)
    }

    /// Build and sign a Bitcoin spend. A `Max` amount spends exactly the
    /// outputs [`max_spendable_btc`](Self::max_spendable_btc) priced, with no change.
    pub async fn compose_btc_transaction(&self, request: &BtcSendRequest) -> Result<ComposedTransaction, WalletError> {
        if request.fee_rate == 0 {
            return Err(WalletError::InvalidParameter("fee rate must be positive".to_string()));
        }
        let snapshot = self.store.current();
        let request = request.clone();

        self.with_keystore(move |keystore| {
            let account = keystore.account(&request.account_id)?;
            let change_account = match &request.change_account_id {
                Some(id) => keystore.account(id)?,
                None => account,
            };
            if account.chain != ChainType::Bitcoin {
                return Err(WalletError::InvalidParameter(format!("{} is not a bitcoin account", account.id)));
            }

            let utxos = snapshot.utxos(&account.id);
            let value = match request.amount {
                SendAmount::Exact(value) => Satoshi::new(
                    u64::try_from(value)
                        .map_err(|_| WalletError::InvalidParameter(format!("amount out of range: {value}")))?,
                ),
                SendAmount::Max => {
                    let script_len = recipient_script(&request.to, account.network)?.len();
                    let max = max_spend_btc(utxos, request.fee_rate, script_len);
                    if max.value < DUST_THRESHOLD {
                        return Err(WalletError::InsufficientFunds {
                            needed: u128::from(max.fee.raw()) + u128::from(DUST_THRESHOLD.raw()),
                            available: utxos.iter().map(|u| u128::from(u.value.raw())).sum(),
                        });
                    }
                    max.value
                }
            };

            let unsigned = build_btc_transaction(
                account,
                utxos,
                change_account,
                BtcTransactionParams {
                    to: request.to.clone(),
                    value,
                    fee_rate: request.fee_rate,
                },
            )?;
            let signed = keystore.with_private_key(&account.id, |key| Ok(unsigned.sign(key)?))?;
            Ok(ComposedTransaction::from_signed(&signed))
        })
        .await
    }

    /// Broadcast a composed transaction and record it as pending.
    pub async fn submit_transaction(&self, composed: &ComposedTransaction) -> Result<String, WalletError> {
        let result = self.broadcast(composed).await;
        if let (Err(WalletError::Broadcast { .. }), Some(nonce)) = (&result, composed.nonce) {
            self.nonces.lease(&composed.account_id).await.release(nonce);
        }
        result
    }

    pub async fn send_eth_transaction(&self, request: &EthSendRequest) -> Result<String, WalletError> {
        let mut lease = self.nonces.lease(&request.account_id).await;
        let composed = self.compose_eth(request, &mut lease).await?;
        let result = self.broadcast(&composed).await;
        if let (Err(WalletError::Broadcast { .. }), Some(nonce)) = (&result, composed.nonce) {
            lease.release(nonce);
        }
        result
    }

    pub async fn send_btc_transaction(&self, request: &BtcSendRequest) -> Result<String, WalletError> {
        let composed = self.compose_btc_transaction(request).await?;
        self.broadcast(&composed).await
    }

    async fn broadcast(&self, composed: &ComposedTransaction) -> Result<String, WalletError> {
        let ack = self.service.broadcast(composed.chain, &composed.raw_hex).await?;
        if !ack.accepted {
            let reason = ack.reason.unwrap_or_else(|| "rejected without reason".to_string());
            warn!(account = %composed.account_id, %reason, "broadcast rejected");
            return Err(WalletError::Broadcast { reason });
        }

        let hash = composed.hash_string();
        if let Some(reported) = ack.hash.as_deref() {
            if !reported.eq_ignore_ascii_case(&hash) {
                warn!(%hash, %reported, "service reported a different transaction hash");
            }
        }
        info!(account = %composed.account_id, %hash, "transaction broadcast");

        let record = TransactionRecord {
            hash: composed.hash,
            account_id: composed.account_id.clone(),
            chain: composed.chain,
            direction: Direction::Outgoing,
            status: TransactionStatus::Pending,
            from: composed.from.clone(),
            to: composed.to.clone(),
            amount: composed.amount,
            fee: composed.fee,
            nonce: composed.nonce,
            submitted_at: Some(self.clock.now()),
            confirmed_at: None,
        };
        self.store.update(|next| {
            next.transactions
                .entry(record.account_id.clone())
                .or_default()
                .insert(0, record);
            if let Some(utxos) = next.utxos.get_mut(&composed.account_id) {
                utxos.retain(|utxo| !composed.spent.iter().any(|s| s.outpoint() == utxo.outpoint()));
            }
            if let Some((owner, output)) = &composed.change {
                next.utxos.entry(owner.clone()).or_default().push(output.clone());
            }
        });
        Ok(hash)
    }

    // ── Fee estimation ──────────────────────────────────────────────────

    /// Balance of `account_id` minus `gas_price * gas_limit`, floored at zero.
    /// Both parameters are base-10 integer strings.
    pub fn max_spendable_eth(&self, account_id: &AccountId, gas_price: &str, gas_limit: &str) -> Result<Wei, WalletError> {
        let gas_price = Wei::new(parse_integer(gas_price)?);
        let gas_limit = u64::try_from(parse_integer(gas_limit)?)
            .map_err(|_| WalletError::InvalidParameter("gas limit out of range".to_string()))?;
        let snapshot = self.store.current();
        let account = snapshot_account(&snapshot, account_id, ChainType::Ethereum)?;
        Ok(max_spendable_eth(Wei::new(snapshot.balance(&account.id)), gas_price, gas_limit))
    }

    pub fn max_spendable_btc(&self, account_id: &AccountId, to: &str, fee_rate: u64) -> Result<Satoshi, WalletError> {
        let snapshot = self.store.current();
        let account = snapshot_account(&snapshot, account_id, ChainType::Bitcoin)?;
        let script_len = recipient_script(to, account.network)?.len();
        Ok(max_spend_btc(snapshot.utxos(&account.id), fee_rate, script_len).value)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The current snapshot. Never waits on the network.
    pub fn get_wallet(&self) -> Arc<StateSnapshot> {
        self.store.current()
    }

    pub fn get_account(&self, chain: ChainType) -> Option<Account> {
        self.store.current().get_account(chain, self.config.network).cloned()
    }

    pub fn get_balance(&self, address: &str) -> Result<u128, WalletError> {
        let snapshot = self.store.current();
        let account = snapshot
            .account_by_address(address)
            .ok_or_else(|| WalletError::InvalidParameter(format!("unknown address {address}")))?;
        Ok(snapshot.balance(&account.id))
    }

    /// History of every account in wallet `wallet_id`, newest first.
    pub fn get_transactions(&self, wallet_id: &str) -> Result<Vec<TransactionRecord>, WalletError> {
        let snapshot = self.store.current();
        if snapshot.wallet_id.as_deref() != Some(wallet_id) {
            return Err(WalletError::InvalidParameter(format!("unknown wallet {wallet_id}")));
        }
        let mut records: Vec<TransactionRecord> = snapshot.transactions.values().flatten().cloned().collect();
        records.sort_by_key(|tx| std::cmp::Reverse(tx.timestamp()));
        Ok(records)
    }

    pub fn get_exchange_rates(&self) -> ExchangeRates {
        self.store.current().exchange_rates.clone()
    }

    /// Exchange terms for a currency pair as of the last sync.
    pub fn get_exchange_setting(&self, from: &str, to: &str) -> Option<ExchangeSetting> {
        self.store.current().exchange_settings.get(from, to).cloned()
    }

    pub async fn fetch_historical_exchange_rates(&self) -> Result<HistoricalExchangeRates, WalletError> {
        Ok(self.service.fetch_historical_exchange_rates().await?)
    }

    pub async fn get_fee_rates(&self, chain: ChainType) -> Result<FeeRates, WalletError> {
        Ok(self.service.fetch_fee_rates(chain).await?)
    }

    // ── Observation ─────────────────────────────────────────────────────

    /// Deliver every snapshot published from now on to `observer` until the
    /// returned guard is dropped or `observer` itself is.
    pub fn subscribe(&self, observer: &Arc<dyn SnapshotObserver>) -> Subscription {
        self.store.subscribe(observer)
    }
}

fn snapshot_account<'a>(
    snapshot: &'a StateSnapshot,
    id: &AccountId,
    chain: ChainType,
) -> Result<&'a Account, WalletError> {
    let account = snapshot
        .account(id)
        .ok_or_else(|| WalletError::InvalidParameter(format!("unknown account {id}")))?;
    if account.chain != chain {
        return Err(WalletError::InvalidParameter(format!("{id} is not a {chain} account")));
    }
    Ok(account)
}
