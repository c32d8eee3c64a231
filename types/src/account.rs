//! Per-chain account owned by a keystore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ChainType, Network, TypesError};

/// Deterministic account identifier: `{chain}:{network}:{index}`.
///
/// Derived from the same inputs as the account's key, so the same mnemonic
/// always yields the same ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(chain: ChainType, network: Network, index: u32) -> Self {
        Self(format!("{}:{}:{}", chain.as_str(), network.as_str(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The chain encoded in this id.
    pub fn chain(&self) -> ChainType {
        // Construction guarantees the prefix parses.
        self.0
            .split(':')
            .next()
            .and_then(|c| c.parse().ok())
            .unwrap_or(ChainType::Ethereum)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(TypesError::InvalidAccountId(s.to_string()));
        }
        let chain: ChainType = parts[0]
            .parse()
            .map_err(|_| TypesError::InvalidAccountId(s.to_string()))?;
        let network: Network = parts[1]
            .parse()
            .map_err(|_| TypesError::InvalidAccountId(s.to_string()))?;
        let index: u32 = parts[2]
            .parse()
            .map_err(|_| TypesError::InvalidAccountId(s.to_string()))?;
        Ok(Self::new(chain, network, index))
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// A derived, public-only view of one chain account.
///
/// Immutable once derived; carries no key material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub chain: ChainType,
    pub network: Network,
    pub address: String,
    pub derivation_path: String,
    pub index: u32,
}
