//! Native segwit (P2WPKH) keys and addresses.

use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::{Address, CompressedPublicKey};
use tessera_types::Network;

use crate::CryptoError;

pub fn bitcoin_network(network: Network) -> bitcoin::Network {
    match network {
        Network::Mainnet => bitcoin::Network::Bitcoin,
        Network::Testnet => bitcoin::Network::Testnet,
    }
}

pub fn public_key(key: &[u8; 32]) -> Result<CompressedPublicKey, CryptoError> {
    let secp = Secp256k1::signing_only();
    let mut secret = SecretKey::from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
    let public = PublicKey::from_secret_key(&secp, &secret);
    secret.non_secure_erase();
    Ok(CompressedPublicKey(public))
}

pub fn p2wpkh_address(key: &[u8; 32], network: Network) -> Result<String, CryptoError> {
    let public = public_key(key)?;
    Ok(Address::p2wpkh(&public, bitcoin_network(network)).to_string())
}
