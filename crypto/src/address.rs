//! Address format validation.

use bitcoin::address::NetworkUnchecked;
use bitcoin::Address;
use tessera_types::Network;

use crate::btc::bitcoin_network;
use crate::eth::{parse_address, to_checksum_address};

/// `0x` + 40 hex digits. All-lowercase and all-uppercase forms carry no
/// checksum and are accepted as is; mixed case must match EIP-55.
pub fn is_valid_eth_address(address: &str) -> bool {
    let Some(bytes) = parse_address(address) else {
        return false;
    };
    let digits = &address[2..];
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(&bytes)[2..] == *digits
}

/// Any standard address type (base58 or bech32/bech32m) valid for `network`.
pub fn is_valid_btc_address(address: &str, network: Network) -> bool {
    address
        .parse::<Address<NetworkUnchecked>>()
        .map(|unchecked| unchecked.is_valid_for_network(bitcoin_network(network)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_checksum_enforced_on_mixed_case() {
        assert!(is_valid_eth_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(is_valid_eth_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(is_valid_eth_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"));
        assert!(!is_valid_eth_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"));
    }

    #[test]
    fn eth_rejects_bad_shapes() {
        assert!(!is_valid_eth_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_valid_eth_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea"));
        assert!(!is_valid_eth_address("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_valid_eth_address(""));
    }

    #[test]
    fn btc_network_is_checked() {
        let mainnet = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";
        assert!(is_valid_btc_address(mainnet, Network::Mainnet));
        assert!(!is_valid_btc_address(mainnet, Network::Testnet));
        assert!(is_valid_btc_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", Network::Mainnet));
        assert!(!is_valid_btc_address("bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyv", Network::Mainnet));
        assert!(!is_valid_btc_address("not an address", Network::Mainnet));
    }
}
