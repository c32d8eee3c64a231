//! UTXO strategy: native segwit (P2WPKH) Bitcoin transactions.
//!
//! Size model, in virtual bytes:
//! - 11 for version, locktime, counts and the segwit marker
//! - 68 per P2WPKH input
//! - `9 + script_len` per output
//!
//! Coin selection is largest-first with ties broken by `(txid, vout)`, so the
//! same UTXO set always yields the same inputs. Change smaller than
//! [`DUST_THRESHOLD`] is left to the miner instead of creating an output.

use bitcoin::address::NetworkUnchecked;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{
    absolute, transaction, Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn,
    TxOut, Txid, Witness,
};
use tessera_crypto::btc::{bitcoin_network, public_key};
use tessera_crypto::CryptoError;
use tessera_types::{Account, AccountId, ChainType, Network, Satoshi, TxHash, Utxo};

use crate::{SignedTransaction, TxError, UnsignedTransaction};

pub const DUST_THRESHOLD: Satoshi = Satoshi::new(546);
pub const TX_OVERHEAD_VBYTES: u64 = 11;
pub const P2WPKH_INPUT_VBYTES: u64 = 68;
pub const P2WPKH_SCRIPT_LEN: usize = 22;

pub fn estimate_vsize(inputs: usize, output_script_lens: &[usize]) -> u64 {
    let outputs: u64 = output_script_lens.iter().map(|len| 9 + *len as u64).sum();
    TX_OVERHEAD_VBYTES + P2WPKH_INPUT_VBYTES * inputs as u64 + outputs
}

/// `vsize * fee_rate` with the rate in sat/vB.
pub fn fee_for_vsize(vsize: u64, fee_rate: u64) -> Satoshi {
    Satoshi::new(vsize.saturating_mul(fee_rate))
}

/// Script for `address`, which must belong to `network`.
pub fn recipient_script(address: &str, network: Network) -> Result<ScriptBuf, TxError> {
    let invalid = || TxError::InvalidParameter(format!("invalid {network} bitcoin address {address}"));
    let unchecked: Address<NetworkUnchecked> = address.parse().map_err(|_| invalid())?;
    let checked = unchecked
        .require_network(bitcoin_network(network))
        .map_err(|_| invalid())?;
    Ok(checked.script_pubkey())
}

/// UTXOs in the order selection consumes them.
pub fn selection_order(utxos: &[Utxo]) -> Vec<Utxo> {
    let mut ordered = utxos.to_vec();
    ordered.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.txid.cmp(&b.txid))
            .then_with(|| a.vout.cmp(&b.vout))
    });
    ordered
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinSelection {
    pub inputs: Vec<Utxo>,
    pub total: Satoshi,
    pub fee: Satoshi,
    /// Zero when the remainder was absorbed into the fee.
    pub change: Satoshi,
}

/// Pick inputs covering `value` plus the fee at `fee_rate`.
pub fn select_coins(
    utxos: &[Utxo],
    value: Satoshi,
    fee_rate: u64,
    recipient_script_len: usize,
    change_script_len: usize,
) -> Result<CoinSelection, TxError> {
    let value = value.raw() as u128;
    let dust = DUST_THRESHOLD.raw() as u128;
    let mut inputs = Vec::new();
    let mut total: u128 = 0;

    for utxo in selection_order(utxos) {
        total += utxo.value.raw() as u128;
        inputs.push(utxo);

        let with_change = fee_for_vsize(
            estimate_vsize(inputs.len(), &[recipient_script_len, change_script_len]),
            fee_rate,
        )
        .raw() as u128;
        let without_change =
            fee_for_vsize(estimate_vsize(inputs.len(), &[recipient_script_len]), fee_rate).raw() as u128;

        if total >= value + with_change + dust {
            return Ok(CoinSelection {
                inputs,
                total: to_sat(total)?,
                fee: to_sat(with_change)?,
                change: to_sat(total - value - with_change)?,
            });
        }
        if total >= value + without_change {
            return Ok(CoinSelection {
                inputs,
                total: to_sat(total)?,
                fee: to_sat(total - value)?,
                change: Satoshi::ZERO,
            });
        }
    }

    let fee = fee_for_vsize(estimate_vsize(utxos.len().max(1), &[recipient_script_len]), fee_rate);
    Err(TxError::InsufficientFunds {
        needed: value + fee.raw() as u128,
        available: total,
    })
}

fn to_sat(value: u128) -> Result<Satoshi, TxError> {
    u64::try_from(value).map(Satoshi::new).map_err(|_| TxError::Overflow)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BtcTransactionParams {
    pub to: String,
    pub value: Satoshi,
    /// Satoshi per virtual byte.
    pub fee_rate: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedBtcTransaction {
    pub account_id: AccountId,
    pub from: String,
    pub network: Network,
    pub inputs: Vec<Utxo>,
    pub to: String,
    pub value: Satoshi,
    pub fee_rate: u64,
    pub fee: Satoshi,
    pub change_account_id: AccountId,
    pub change_address: String,
    pub change: Satoshi,
}

pub fn build_btc_transaction(
    account: &Account,
    utxos: &[Utxo],
    change_account: &Account,
    params: BtcTransactionParams,
) -> Result<UnsignedBtcTransaction, TxError> {
    for acct in [account, change_account] {
        if acct.chain != ChainType::Bitcoin {
            return Err(TxError::InvalidParameter(format!(
                "account {} is not a bitcoin account",
                acct.id
            )));
        }
    }
    if change_account.network != account.network {
        return Err(TxError::InvalidParameter("change account is on another network".into()));
    }
    if params.value < DUST_THRESHOLD {
        return Err(TxError::InvalidParameter(format!(
            "amount {} is below the dust threshold",
            params.value
        )));
    }

    let recipient = recipient_script(&params.to, account.network)?;
    let change_script = recipient_script(&change_account.address, account.network)?;
    let selection = select_coins(
        utxos,
        params.value,
        params.fee_rate,
        recipient.len(),
        change_script.len(),
    )?;

    Ok(UnsignedBtcTransaction {
        account_id: account.id.clone(),
        from: account.address.clone(),
        network: account.network,
        inputs: selection.inputs,
        to: params.to,
        value: params.value,
        fee_rate: params.fee_rate,
        fee: selection.fee,
        change_account_id: change_account.id.clone(),
        change_address: change_account.address.clone(),
        change: selection.change,
    })
}

impl UnsignedBtcTransaction {
    fn unsigned_tx(&self) -> Result<Transaction, TxError> {
        let mut output = vec![TxOut {
            value: Amount::from_sat(self.value.raw()),
            script_pubkey: recipient_script(&self.to, self.network)?,
        }];
        if !self.change.is_zero() {
            output.push(TxOut {
                value: Amount::from_sat(self.change.raw()),
                script_pubkey: recipient_script(&self.change_address, self.network)?,
            });
        }
        let input = self
            .inputs
            .iter()
            .map(|utxo| TxIn {
                previous_output: OutPoint {
                    txid: to_txid(&utxo.txid),
                    vout: utxo.vout,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::new(),
            })
            .collect();
        Ok(Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input,
            output,
        })
    }

    /// Sign every input with `key` (BIP143, SIGHASH_ALL).
    pub fn sign(&self, key: &[u8; 32]) -> Result<SignedTransaction, TxError> {
        let public = public_key(key)?;
        let own_script = ScriptBuf::new_p2wpkh(&public.wpubkey_hash());
        if own_script != recipient_script(&self.from, self.network)? {
            return Err(TxError::Signing("key does not control the sending address".into()));
        }

        let mut tx = self.unsigned_tx()?;
        let mut secret = SecretKey::from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
        let witnesses = self.witnesses(&tx, &own_script, &secret, &public.0);
        secret.non_secure_erase();

        for (input, witness) in tx.input.iter_mut().zip(witnesses?) {
            input.witness = witness;
        }

        let mut txid = tx.compute_txid().to_byte_array();
        txid.reverse();
        Ok(SignedTransaction {
            unsigned: UnsignedTransaction::Btc(self.clone()),
            raw: bitcoin::consensus::encode::serialize(&tx),
            hash: TxHash::new(txid),
        })
    }

    fn witnesses(
        &self,
        tx: &Transaction,
        own_script: &ScriptBuf,
        secret: &SecretKey,
        public: &bitcoin::secp256k1::PublicKey,
    ) -> Result<Vec<Witness>, TxError> {
        let secp = Secp256k1::signing_only();
        let mut cache = SighashCache::new(tx);
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, utxo)| {
                let sighash = cache
                    .p2wpkh_signature_hash(
                        i,
                        own_script,
                        Amount::from_sat(utxo.value.raw()),
                        EcdsaSighashType::All,
                    )
                    .map_err(|e| TxError::Signing(e.to_string()))?;
                let message = Message::from_digest(sighash.to_byte_array());
                let signature = bitcoin::ecdsa::Signature {
                    signature: secp.sign_ecdsa(&message, secret),
                    sighash_type: EcdsaSighashType::All,
                };
                Ok(Witness::p2wpkh(&signature, public))
            })
            .collect()
    }
}

/// Txids are stored in display order; the wire format is reversed.
fn to_txid(hash: &TxHash) -> Txid {
    let mut bytes = *hash.as_bytes();
    bytes.reverse();
    Txid::from_byte_array(bytes)
}
