//! Keystore lifecycle: `Uninitialized -> Locked -> Unlocked`.
//!
//! The manager owns the encrypted keystore document and, while unlocked, the
//! decrypted seed. Private keys are never stored; they are re-derived from the
//! seed for each signing call and wiped when that call returns.

use tessera_crypto::{derive_account, derive_private_key, derive_seed, validate_mnemonic, Seed};
use tessera_types::{Account, AccountId, ChainType, Network, Timestamp};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::keystore::{decrypt_keystore, encrypt_keystore, KdfParams, KeystoreFile, KeystoreSecret, KeystoreStorage};

/// Only one account per chain is derived.
const ACCOUNT_INDEX: u32 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeystoreState {
    Uninitialized,
    Locked,
    Unlocked,
}

struct UnlockedKeys {
    seed: Seed,
    accounts: Vec<Account>,
}

pub struct KeystoreManager {
    storage: KeystoreStorage,
    network: Network,
    kdf: KdfParams,
    keystore: Option<KeystoreFile>,
    unlocked: Option<UnlockedKeys>,
}

impl KeystoreManager {
    /// Open the manager, picking up a keystore already present in `storage`.
    pub fn open(storage: KeystoreStorage, network: Network, kdf: KdfParams) -> Result<Self, WalletError> {
        let keystore = storage.load()?;
        if let Some(ks) = &keystore {
            debug!(id = %ks.id, "found existing keystore");
        }
        Ok(Self {
            storage,
            network,
            kdf,
            keystore,
            unlocked: None,
        })
    }

    pub fn state(&self) -> KeystoreState {
        match (&self.keystore, &self.unlocked) {
            (None, _) => KeystoreState::Uninitialized,
            (Some(_), None) => KeystoreState::Locked,
            (Some(_), Some(_)) => KeystoreState::Unlocked,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn keystore_id(&self) -> Option<&str> {
        self.keystore.as_ref().map(|ks| ks.id.as_str())
    }

    /// Encrypt and persist a new keystore for `mnemonic`, replacing any
    /// previous one, then unlock it with the same password.
    pub fn create(
        &mut self,
        mnemonic: &str,
        passphrase: Option<&str>,
        password: &str,
        now: Timestamp,
    ) -> Result<Vec<Account>, WalletError> {
        let mnemonic = normalize_phrase(mnemonic);
        if !validate_mnemonic(&mnemonic) {
            return Err(WalletError::InvalidParameter("invalid mnemonic".to_string()));
        }
        if password.is_empty() {
            return Err(WalletError::InvalidParameter("password must not be empty".to_string()));
        }

        let secret = KeystoreSecret {
            mnemonic,
            passphrase: passphrase.filter(|p| !p.is_empty()).map(str::to_string),
        };
        let keystore = encrypt_keystore(&secret, password, &self.kdf, now)?;
        self.storage.save(&keystore)?;

        self.unlocked = None;
        info!(id = %keystore.id, "keystore created");
        self.keystore = Some(keystore);
        self.unlock(password)
    }

    /// Decrypt the keystore and derive one account per supported chain.
    ///
    /// Fails with [`WalletError::Authentication`] both for a wrong password
    /// and when no keystore exists.
    pub fn unlock(&mut self, password: &str) -> Result<Vec<Account>, WalletError> {
        let keystore = self.keystore.as_ref().ok_or(WalletError::Authentication)?;
        let secret = decrypt_keystore(keystore, password)?;
        let seed = derive_seed(&secret.mnemonic, secret.passphrase.as_deref())?;

        let accounts = ChainType::ALL
            .iter()
            .map(|&chain| {
                let derived = derive_account(&seed, chain, self.network, ACCOUNT_INDEX)?;
                Ok(Account {
                    id: AccountId::new(chain, self.network, ACCOUNT_INDEX),
                    chain,
                    network: self.network,
                    address: derived.address,
                    derivation_path: derived.derivation_path,
                    index: ACCOUNT_INDEX,
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;

        info!(id = %keystore.id, accounts = accounts.len(), "keystore unlocked");
        self.unlocked = Some(UnlockedKeys {
            seed,
            accounts: accounts.clone(),
        });
        Ok(accounts)
    }

    /// Re-authenticate and return the stored mnemonic.
    pub fn reveal_mnemonic(&self, password: &str) -> Result<Zeroizing<String>, WalletError> {
        let keystore = self.keystore.as_ref().ok_or(WalletError::Authentication)?;
        let secret = decrypt_keystore(keystore, password)?;
        Ok(Zeroizing::new(secret.mnemonic.clone()))
    }

    /// Drop the decrypted seed, keeping the keystore.
    pub fn lock(&mut self) {
        if self.unlocked.take().is_some() {
            info!("keystore locked");
        }
    }

    /// Wipe secrets and destroy the keystore. Idempotent.
    pub fn clear(&mut self) -> Result<(), WalletError> {
        self.unlocked = None;
        self.storage.remove()?;
        if let Some(ks) = self.keystore.take() {
            info!(id = %ks.id, "keystore cleared");
        }
        Ok(())
    }

    pub fn accounts(&self) -> Result<&[Account], WalletError> {
        self.unlocked
            .as_ref()
            .map(|keys| keys.accounts.as_slice())
            .ok_or(WalletError::NotUnlocked)
    }

    pub fn account(&self, id: &AccountId) -> Result<&Account, WalletError> {
        self.accounts()?
            .iter()
            .find(|a| &a.id == id)
            .ok_or_else(|| WalletError::InvalidParameter(format!("unknown account {id}")))
    }

    /// Run `f` with the private key of `id`. The key is wiped on every exit path.
    pub fn with_private_key<T>(
        &self,
        id: &AccountId,
        f: impl FnOnce(&[u8; 32]) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let keys = self.unlocked.as_ref().ok_or(WalletError::NotUnlocked)?;
        let account = keys
            .accounts
            .iter()
            .find(|a| &a.id == id)
            .ok_or_else(|| WalletError::InvalidParameter(format!("unknown account {id}")))?;
        let key = derive_private_key(&keys.seed, &account.derivation_path)?;
        f(&key)
    }
}

fn normalize_phrase(phrase: &str) -> String {
    phrase.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn manager() -> KeystoreManager {
        KeystoreManager::open(KeystoreStorage::Memory, Network::Mainnet, KdfParams::light()).unwrap()
    }

    #[test]
    fn starts_uninitialized() {
        let m = manager();
        assert_eq!(m.state(), KeystoreState::Uninitialized);
        assert_eq!(m.accounts(), Err(WalletError::NotUnlocked));
    }

    #[test]
    fn create_unlocks_with_golden_accounts() {
        let mut m = manager();
        let accounts = m.create(PHRASE, None, "pw", Timestamp::from_secs(1)).unwrap();
        assert_eq!(m.state(), KeystoreState::Unlocked);
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(accounts[0].id.as_str(), "eth:mainnet:0");
        assert_eq!(accounts[1].address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
    }

    #[test]
    fn create_rejects_bad_mnemonic() {
        let mut m = manager();
        let err = m.create("abandon abandon", None, "pw", Timestamp::EPOCH).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
        assert_eq!(m.state(), KeystoreState::Uninitialized);
    }

    #[test]
    fn lock_and_unlock() {
        let mut m = manager();
        m.create(PHRASE, None, "pw", Timestamp::EPOCH).unwrap();
        m.lock();
        assert_eq!(m.state(), KeystoreState::Locked);
        assert_eq!(m.unlock("nope"), Err(WalletError::Authentication));
        assert_eq!(m.state(), KeystoreState::Locked);
        m.unlock("pw").unwrap();
        assert_eq!(m.state(), KeystoreState::Unlocked);
    }

    #[test]
    fn unlock_without_keystore_looks_like_wrong_password() {
        let mut m = manager();
        assert_eq!(m.unlock("pw"), Err(WalletError::Authentication));
    }

    #[test]
    fn reveal_requires_password_even_when_unlocked() {
        let mut m = manager();
        m.create(&format!("  {PHRASE} "), None, "pw", Timestamp::EPOCH).unwrap();
        assert_eq!(m.reveal_mnemonic("wrong"), Err(WalletError::Authentication));
        assert_eq!(m.reveal_mnemonic("pw").unwrap().as_str(), PHRASE);
    }

    #[test]
    fn passphrase_changes_accounts() {
        let mut plain = manager();
        let mut salted = manager();
        let a = plain.create(PHRASE, None, "pw", Timestamp::EPOCH).unwrap();
        let b = salted.create(PHRASE, Some("TREZOR"), "pw", Timestamp::EPOCH).unwrap();
        assert_ne!(a[0].address, b[0].address);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut m = manager();
        m.create(PHRASE, None, "pw", Timestamp::EPOCH).unwrap();
        m.clear().unwrap();
        assert_eq!(m.state(), KeystoreState::Uninitialized);
        assert!(m.keystore_id().is_none());
        m.clear().unwrap();
        assert_eq!(m.unlock("pw"), Err(WalletError::Authentication));
    }

    #[test]
    fn private_key_matches_account_address() {
        let mut m = manager();
        let accounts = m.create(PHRASE, None, "pw", Timestamp::EPOCH).unwrap();
        let eth = &accounts[0];
        let address = m
            .with_private_key(&eth.id, |key| Ok(tessera_crypto::eth::address_from_private_key(key)?))
            .unwrap();
        assert_eq!(address, eth.address);

        m.lock();
        assert_eq!(m.with_private_key(&eth.id, |_| Ok(())), Err(WalletError::NotUnlocked));
    }

    #[test]
    fn file_keystore_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        let mut first =
            KeystoreManager::open(KeystoreStorage::File(path.clone()), Network::Testnet, KdfParams::light()).unwrap();
        let created = first.create(PHRASE, None, "pw", Timestamp::EPOCH).unwrap();
        let id = first.keystore_id().map(str::to_string);

        let mut second =
            KeystoreManager::open(KeystoreStorage::File(path.clone()), Network::Testnet, KdfParams::light()).unwrap();
        assert_eq!(second.state(), KeystoreState::Locked);
        assert_eq!(second.keystore_id().map(str::to_string), id);
        assert_eq!(second.unlock("pw").unwrap(), created);

        second.clear().unwrap();
        assert!(!path.exists());
    }
}
