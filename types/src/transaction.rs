//! Transaction history records as stored in the wallet snapshot.

use serde::{Deserialize, Serialize};

use crate::{AccountId, ChainType, Timestamp, TxHash};

/// Lifecycle status reported by the transaction service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
    Resubmitted,
    Cancelled,
    Paused,
    Rejected,
}

impl TransactionStatus {
    /// No further status transitions are expected.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::Cancelled | Self::Rejected)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// One entry of an account's history.
///
/// `amount` and `fee` are in the chain's base unit (wei or satoshi).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub account_id: AccountId,
    pub chain: ChainType,
    pub direction: Direction,
    pub status: TransactionStatus,
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub fee: u128,
    #[serde(default)]
    pub nonce: Option<u64>,
    #[serde(default)]
    pub submitted_at: Option<Timestamp>,
    #[serde(default)]
    pub confirmed_at: Option<Timestamp>,
}

impl TransactionRecord {
    /// The earliest known point in time for this transaction.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match (self.submitted_at, self.confirmed_at) {
            (Some(s), Some(c)) => Some(s.min(c)),
            (s, c) => s.or(c),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Network;

    fn record(submitted: Option<u64>, confirmed: Option<u64>) -> TransactionRecord {
        TransactionRecord {
            hash: TxHash::new([7u8; 32]),
            account_id: AccountId::new(ChainType::Ethereum, Network::Mainnet, 0),
            chain: ChainType::Ethereum,
            direction: Direction::Outgoing,
            status: TransactionStatus::Pending,
            from: "0xaa".into(),
            to: "0xbb".into(),
            amount: 1,
            fee: 2,
            nonce: Some(0),
            submitted_at: submitted.map(Timestamp::from_millis),
            confirmed_at: confirmed.map(Timestamp::from_millis),
        }
    }

    #[test]
    fn timestamp_prefers_earliest_known() {
        assert_eq!(record(None, None).timestamp(), None);
        assert_eq!(record(Some(5), None).timestamp(), Some(Timestamp::from_millis(5)));
        assert_eq!(record(None, Some(9)).timestamp(), Some(Timestamp::from_millis(9)));
        assert_eq!(record(Some(20), Some(9)).timestamp(), Some(Timestamp::from_millis(9)));
    }

    #[test]
    fn status_uses_lowercase_names() {
        let json = serde_json::to_string(&TransactionStatus::Resubmitted).unwrap();
        assert_eq!(json, "\"resubmitted\"");
        assert!(TransactionStatus::Rejected.is_final());
        assert!(!TransactionStatus::Paused.is_final());
    }
}
