//! Recoverable secp256k1 ECDSA over 32-byte prehashes (Ethereum style).
//!
//! Nonces follow RFC 6979, so signing the same digest with the same key always
//! yields the same signature; `s` is normalised to the lower half of the order.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use crate::eth::{address_bytes_from_public, to_checksum_address};
use crate::CryptoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1; parity of the ephemeral point's y coordinate.
    pub recovery_id: u8,
}

pub fn sign_recoverable(key: &[u8; 32], prehash: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
    let signing_key = SigningKey::from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(prehash)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (low, RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced())),
        None => (signature, recovery_id),
    };

    let bytes = signature.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    Ok(RecoverableSignature {
        r,
        s,
        recovery_id: recovery_id.to_byte(),
    })
}

/// Recover the checksummed Ethereum address that produced `signature`.
pub fn recover_eth_address(prehash: &[u8; 32], signature: &RecoverableSignature) -> Option<String> {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(&signature.r);
    bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&bytes).ok()?;
    let recid = RecoveryId::from_byte(signature.recovery_id)?;
    let key = VerifyingKey::recover_from_prehash(prehash, &sig, recid).ok()?;
    let point = key.to_encoded_point(false);
    Some(to_checksum_address(&address_bytes_from_public(point.as_bytes())))
}
