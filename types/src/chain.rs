//! Chain and network identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// How a chain tracks funds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerModel {
    /// Running balance per address, transactions ordered by nonce.
    Account,
    /// Discrete unspent outputs, change returned explicitly.
    Utxo,
}

/// Chains the engine can derive accounts for and sign on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainType {
    #[serde(rename = "eth")]
    Ethereum,
    #[serde(rename = "btc")]
    Bitcoin,
}

impl ChainType {
    /// Every chain, in the order accounts are derived on unlock.
    pub const ALL: [ChainType; 2] = [ChainType::Ethereum, ChainType::Bitcoin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "eth",
            Self::Bitcoin => "btc",
        }
    }

    /// Ticker used for exchange rates and display.
    pub fn currency_code(&self) -> &'static str {
        match self {
            Self::Ethereum => "ETH",
            Self::Bitcoin => "BTC",
        }
    }

    pub fn model(&self) -> LedgerModel {
        match self {
            Self::Ethereum => LedgerModel::Account,
            Self::Bitcoin => LedgerModel::Utxo,
        }
    }

    /// Number of decimal places between the display unit and the base unit.
    pub fn decimals(&self) -> u32 {
        match self {
            Self::Ethereum => 18,
            Self::Bitcoin => 8,
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eth" | "ethereum" => Ok(Self::Ethereum),
            "btc" | "bitcoin" => Ok(Self::Bitcoin),
            other => Err(TypesError::UnknownChain(other.to_string())),
        }
    }
}

/// Which network the wallet operates on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// EIP-155 chain id used when signing account-model transactions.
    pub fn eth_chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Testnet => 5,
        }
    }

    /// BIP44 coin type used in the bitcoin derivation path.
    pub fn btc_coin_type(&self) -> u32 {
        match self {
            Self::Mainnet => 0,
            Self::Testnet => 1,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" | "test" | "goerli" => Ok(Self::Testnet),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_parses_both_spellings() {
        assert_eq!("ETH".parse::<ChainType>().unwrap(), ChainType::Ethereum);
        assert_eq!("bitcoin".parse::<ChainType>().unwrap(), ChainType::Bitcoin);
        assert!("doge".parse::<ChainType>().is_err());
    }

    #[test]
    fn chain_models() {
        assert_eq!(ChainType::Ethereum.model(), LedgerModel::Account);
        assert_eq!(ChainType::Bitcoin.model(), LedgerModel::Utxo);
    }

    #[test]
    fn network_parameters() {
        assert_eq!(Network::Mainnet.eth_chain_id(), 1);
        assert_eq!(Network::Testnet.btc_coin_type(), 1);
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
    }

    #[test]
    fn chain_serializes_as_ticker() {
        let json = serde_json::to_string(&ChainType::Bitcoin).unwrap();
        assert_eq!(json, "\"btc\"");
    }
}
