//! Ethereum addresses: Keccak-256 of the uncompressed public key, EIP-55 checksummed.

use k256::ecdsa::SigningKey;

use crate::{keccak256, CryptoError};

/// 20-byte address from a 65-byte uncompressed SEC1 public key.
pub fn address_bytes_from_public(uncompressed: &[u8]) -> [u8; 20] {
    let hash = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    out
}

pub fn address_from_private_key(key: &[u8; 32]) -> Result<String, CryptoError> {
    let signing_key = SigningKey::from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
    let point = signing_key.verifying_key().to_encoded_point(false);
    Ok(to_checksum_address(&address_bytes_from_public(point.as_bytes())))
}

/// EIP-55: uppercase each hex letter whose nibble in keccak(lower_hex) is >= 8.
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse `0x` + 40 hex digits, ignoring case.
pub fn parse_address(address: &str) -> Option<[u8; 20]> {
    let digits = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X"))?;
    if digits.len() != 40 {
        return None;
    }
    let bytes = hex::decode(digits).ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let bytes = parse_address(expected).unwrap();
            assert_eq!(to_checksum_address(&bytes), expected);
        }
    }

    #[test]
    fn known_private_key_address() {
        let mut key = [0u8; 32];
        hex::decode_to_slice(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
            &mut key,
        )
        .unwrap();
        assert_eq!(
            address_from_private_key(&key).unwrap(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
    }

    #[test]
    fn zero_key_rejected() {
        assert_eq!(address_from_private_key(&[0u8; 32]), Err(CryptoError::InvalidKey));
    }
}
