//! Transaction builders and signers, one strategy per ledger model.
//!
//! - **Account model** ([`eth`]): legacy EIP-155 Ethereum transfers with explicit nonce
//! - **UTXO model** ([`btc`]): P2WPKH Bitcoin spends with deterministic coin selection
//!
//! [`fee`] holds the fee models and the maximum-spendable estimators that share
//! the builders' arithmetic.

pub mod btc;
pub mod error;
pub mod eth;
pub mod fee;
pub mod rlp;

pub use btc::{build_btc_transaction, select_coins, BtcTransactionParams, CoinSelection, UnsignedBtcTransaction};
pub use error::TxError;
pub use eth::{build_eth_transaction, EthTransactionParams, UnsignedEthTransaction};
pub use fee::{max_spend_btc, max_spendable_btc, max_spendable_eth, BtcMaxSpend};

use tessera_types::{AccountId, ChainType, TxHash};

/// A built, not yet signed transaction for either ledger model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnsignedTransaction {
    Eth(UnsignedEthTransaction),
    Btc(UnsignedBtcTransaction),
}

impl UnsignedTransaction {
    pub fn chain(&self) -> ChainType {
        match self {
            Self::Eth(_) => ChainType::Ethereum,
            Self::Btc(_) => ChainType::Bitcoin,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        match self {
            Self::Eth(tx) => &tx.account_id,
            Self::Btc(tx) => &tx.account_id,
        }
    }

    pub fn from_address(&self) -> &str {
        match self {
            Self::Eth(tx) => &tx.from,
            Self::Btc(tx) => &tx.from,
        }
    }

    pub fn to_address(&self) -> String {
        match self {
            Self::Eth(tx) => tx.to_address(),
            Self::Btc(tx) => tx.to.clone(),
        }
    }

    /// Amount delivered to the recipient, in base units.
    pub fn value(&self) -> u128 {
        match self {
            Self::Eth(tx) => tx.value.raw(),
            Self::Btc(tx) => tx.value.raw() as u128,
        }
    }

    /// Fee in base units (the gas ceiling for Ethereum).
    pub fn fee(&self) -> u128 {
        match self {
            Self::Eth(tx) => tx.fee().raw(),
            Self::Btc(tx) => tx.fee.raw() as u128,
        }
    }

    pub fn nonce(&self) -> Option<u64> {
        match self {
            Self::Eth(tx) => Some(tx.nonce),
            Self::Btc(_) => None,
        }
    }

    /// Sign with the private key of the sending account.
    pub fn sign(&self, key: &[u8; 32]) -> Result<SignedTransaction, TxError> {
        match self {
            Self::Eth(tx) => tx.sign(key),
            Self::Btc(tx) => tx.sign(key),
        }
    }
}

/// A signed transaction ready for broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub unsigned: UnsignedTransaction,
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

impl SignedTransaction {
    /// Raw bytes as the broadcast endpoints expect them: `0x`-prefixed for
    /// Ethereum, bare hex for Bitcoin.
    pub fn raw_hex(&self) -> String {
        match self.unsigned {
            UnsignedTransaction::Eth(_) => format!("0x{}", hex::encode(&self.raw)),
            UnsignedTransaction::Btc(_) => hex::encode(&self.raw),
        }
    }

    /// Hash formatted for the chain's explorers.
    pub fn hash_string(&self) -> String {
        match self.unsigned {
            UnsignedTransaction::Eth(_) => self.hash.to_prefixed(),
            UnsignedTransaction::Btc(_) => self.hash.to_string(),
        }
    }
}
