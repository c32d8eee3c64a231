use serde::{Deserialize, Serialize};

use crate::{Satoshi, TxHash};

/// An unspent output owned by a UTXO-model account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: TxHash,
    pub vout: u32,
    pub value: Satoshi,
    #[serde(default)]
    pub confirmations: u32,
}

impl Utxo {
    /// `(txid, vout)` identifies the output uniquely.
    pub fn outpoint(&self) -> (TxHash, u32) {
        (self.txid, self.vout)
    }
}
