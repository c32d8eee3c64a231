//! String-in, string-out conversions and validators for callers that do not
//! link the typed amount API.

use tessera_types::{units, Network, Satoshi, Wei};

use crate::error::WalletError;

pub fn eth_to_wei(eth: &str) -> Result<String, WalletError> {
    Ok(units::eth_to_wei(eth)?.raw().to_string())
}

pub fn wei_to_eth(wei: &str) -> Result<String, WalletError> {
    Ok(units::wei_to_eth(Wei::new(parse_integer(wei)?)))
}

pub fn eth_to_gwei(eth: &str) -> Result<String, WalletError> {
    Ok(units::eth_to_gwei(eth)?)
}

pub fn gwei_to_eth(gwei: &str) -> Result<String, WalletError> {
    Ok(units::gwei_to_eth(gwei)?)
}

pub fn btc_to_satoshi(btc: &str) -> Result<String, WalletError> {
    Ok(units::btc_to_satoshi(btc)?.raw().to_string())
}

pub fn satoshi_to_btc(sat: &str) -> Result<String, WalletError> {
    let sat = u64::try_from(parse_integer(sat)?)
        .map_err(|_| WalletError::InvalidParameter(format!("satoshi amount out of range: {sat}")))?;
    Ok(units::satoshi_to_btc(Satoshi::new(sat)))
}

pub fn is_valid_eth_address(address: &str) -> bool {
    tessera_crypto::is_valid_eth_address(address)
}

pub fn is_valid_btc_address(address: &str, network: Network) -> bool {
    tessera_crypto::is_valid_btc_address(address, network)
}

/// Parse a non-negative base-10 integer such as a wei amount or gas limit.
pub fn parse_integer(value: &str) -> Result<u128, WalletError> {
    if value.contains('.') {
        return Err(WalletError::InvalidParameter(format!("expected an integer, got '{value}'")));
    }
    Ok(units::parse_decimal(value, 0)?)
}
