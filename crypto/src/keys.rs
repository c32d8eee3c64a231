//! BIP32 derivation of per-chain account keys.
//!
//! Paths:
//! - Ethereum: `m/44'/60'/0'/0/{index}`
//! - Bitcoin (native segwit): `m/84'/{coin}'/0'/0/{index}`, coin 0 on mainnet, 1 on testnet

use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::Secp256k1;
use std::str::FromStr;
use tessera_types::{ChainType, Network};
use zeroize::Zeroizing;

use crate::{btc, eth, CryptoError, Seed};

/// Raw secp256k1 private key, wiped on drop.
pub type PrivateKeyBytes = Zeroizing<[u8; 32]>;

pub fn derivation_path(chain: ChainType, network: Network, index: u32) -> String {
    match chain {
        ChainType::Ethereum => format!("m/44'/60'/0'/0/{index}"),
        ChainType::Bitcoin => format!("m/84'/{}'/0'/0/{index}", network.btc_coin_type()),
    }
}

/// Derive the private key at `path` from `seed`.
pub fn derive_private_key(seed: &Seed, path: &str) -> Result<PrivateKeyBytes, CryptoError> {
    let path = DerivationPath::from_str(path).map_err(|e| CryptoError::Derivation(e.to_string()))?;
    let secp = Secp256k1::signing_only();

    // The network kind only affects xpriv serialisation, never key material.
    let mut master = Xpriv::new_master(bitcoin::Network::Bitcoin, seed.as_bytes())
        .map_err(|e| CryptoError::Derivation(e.to_string()))?;
    let derived = master.derive_priv(&secp, &path);
    master.private_key.non_secure_erase();

    let mut child = derived.map_err(|e| CryptoError::Derivation(e.to_string()))?;
    let bytes = Zeroizing::new(child.private_key.secret_bytes());
    child.private_key.non_secure_erase();
    Ok(bytes)
}

/// Public data of a derived account: the key itself is dropped before returning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedAccount {
    pub address: String,
    pub derivation_path: String,
}

pub fn derive_account(
    seed: &Seed,
    chain: ChainType,
    network: Network,
    index: u32,
) -> Result<DerivedAccount, CryptoError> {
    let path = derivation_path(chain, network, index);
    let key = derive_private_key(seed, &path)?;
    let address = match chain {
        ChainType::Ethereum => eth::address_from_private_key(&key)?,
        ChainType::Bitcoin => btc::p2wpkh_address(&key, network)?,
    };
    Ok(DerivedAccount {
        address,
        derivation_path: path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive_seed;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn seed() -> Seed {
        derive_seed(ABANDON_ABOUT, None).unwrap()
    }

    #[test]
    fn paths_follow_coin_types() {
        assert_eq!(derivation_path(ChainType::Ethereum, Network::Testnet, 0), "m/44'/60'/0'/0/0");
        assert_eq!(derivation_path(ChainType::Bitcoin, Network::Mainnet, 2), "m/84'/0'/0'/0/2");
        assert_eq!(derivation_path(ChainType::Bitcoin, Network::Testnet, 0), "m/84'/1'/0'/0/0");
    }

    #[test]
    fn ethereum_golden_address() {
        let account = derive_account(&seed(), ChainType::Ethereum, Network::Mainnet, 0).unwrap();
        assert_eq!(account.address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn bitcoin_golden_address() {
        let account = derive_account(&seed(), ChainType::Bitcoin, Network::Mainnet, 0).unwrap();
        assert_eq!(account.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
    }

    #[test]
    fn testnet_bitcoin_uses_testnet_hrp() {
        let account = derive_account(&seed(), ChainType::Bitcoin, Network::Testnet, 0).unwrap();
        assert!(account.address.starts_with("tb1q"));
    }

    #[test]
    fn derivation_is_deterministic_per_index() {
        let s = seed();
        let a = derive_private_key(&s, "m/44'/60'/0'/0/0").unwrap();
        let b = derive_private_key(&s, "m/44'/60'/0'/0/0").unwrap();
        let c = derive_private_key(&s, "m/44'/60'/0'/0/1").unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn malformed_path_rejected() {
        assert!(matches!(
            derive_private_key(&seed(), "m/44'/x"),
            Err(CryptoError::Derivation(_))
        ));
    }
}
