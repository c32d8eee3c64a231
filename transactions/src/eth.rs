//! Account-model strategy: legacy EIP-155 Ethereum transactions.

use tessera_crypto::eth::{parse_address, to_checksum_address};
use tessera_crypto::{is_valid_eth_address, keccak256, sign_recoverable};
use tessera_types::{Account, AccountId, ChainType, TxHash, Wei};

use crate::fee::eth_fee;
use crate::rlp::{encode_bytes, encode_list, encode_uint, encode_uint_bytes};
use crate::{SignedTransaction, TxError, UnsignedTransaction};

/// Gas consumed by a plain value transfer; no transaction can use less.
pub const MIN_GAS_LIMIT: u64 = 21_000;

/// Caller-supplied parameters for an account-model transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthTransactionParams {
    pub to: String,
    pub value: Wei,
    /// Wei per unit of gas.
    pub gas_price: Wei,
    pub gas_limit: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedEthTransaction {
    pub account_id: AccountId,
    pub from: String,
    pub to: [u8; 20],
    pub value: Wei,
    pub gas_price: Wei,
    pub gas_limit: u64,
    pub nonce: u64,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// Validate parameters against the sender's balance and assemble the transaction.
pub fn build_eth_transaction(
    account: &Account,
    balance: Wei,
    params: EthTransactionParams,
) -> Result<UnsignedEthTransaction, TxError> {
    if account.chain != ChainType::Ethereum {
        return Err(TxError::InvalidParameter(format!(
            "account {} is not an ethereum account",
            account.id
        )));
    }
    if !is_valid_eth_address(&params.to) {
        return Err(TxError::InvalidParameter(format!("invalid recipient address {}", params.to)));
    }
    let to = parse_address(&params.to)
        .ok_or_else(|| TxError::InvalidParameter(format!("invalid recipient address {}", params.to)))?;
    if params.gas_limit < MIN_GAS_LIMIT {
        return Err(TxError::InvalidParameter(format!(
            "gas limit {} below minimum {MIN_GAS_LIMIT}",
            params.gas_limit
        )));
    }

    let fee = eth_fee(params.gas_price, params.gas_limit).ok_or(TxError::Overflow)?;
    let needed = params.value.checked_add(fee).ok_or(TxError::Overflow)?;
    if needed > balance {
        return Err(TxError::InsufficientFunds {
            needed: needed.raw(),
            available: balance.raw(),
        });
    }

    Ok(UnsignedEthTransaction {
        account_id: account.id.clone(),
        from: account.address.clone(),
        to,
        value: params.value,
        gas_price: params.gas_price,
        gas_limit: params.gas_limit,
        nonce: params.nonce,
        data: params.data,
        chain_id: account.network.eth_chain_id(),
    })
}

impl UnsignedEthTransaction {
    pub fn to_address(&self) -> String {
        to_checksum_address(&self.to)
    }

    /// Maximum fee this transaction can burn: `gas_price * gas_limit`.
    pub fn fee(&self) -> Wei {
        eth_fee(self.gas_price, self.gas_limit).unwrap_or(Wei::new(u128::MAX))
    }

    fn fields(&self) -> Vec<Vec<u8>> {
        vec![
            encode_uint(self.nonce as u128),
            encode_uint(self.gas_price.raw()),
            encode_uint(self.gas_limit as u128),
            encode_bytes(&self.to),
            encode_uint(self.value.raw()),
            encode_bytes(&self.data),
        ]
    }

    /// EIP-155 signing payload: the six fields followed by `chain_id, 0, 0`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut items = self.fields();
        items.push(encode_uint(self.chain_id as u128));
        items.push(encode_uint(0));
        items.push(encode_uint(0));
        encode_list(&items)
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    pub fn sign(&self, key: &[u8; 32]) -> Result<SignedTransaction, TxError> {
        let signature = sign_recoverable(key, &self.signing_hash())?;
        let v = signature.recovery_id as u128 + 2 * self.chain_id as u128 + 35;

        let mut items = self.fields();
        items.push(encode_uint(v));
        items.push(encode_uint_bytes(&signature.r));
        items.push(encode_uint_bytes(&signature.s));
        let raw = encode_list(&items);
        let hash = TxHash::new(keccak256(&raw));

        Ok(SignedTransaction {
            unsigned: UnsignedTransaction::Eth(self.clone()),
            raw,
            hash,
        })
    }
}

/// Parse an optional `0x`-prefixed hex call-data payload.
pub fn parse_data(data: &str) -> Result<Vec<u8>, TxError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|_| TxError::InvalidParameter(format!("invalid hex data {data}")))
}
