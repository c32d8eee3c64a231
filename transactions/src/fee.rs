//! Fee models and maximum-spendable estimation.
//!
//! The Bitcoin estimate walks the same largest-first order as coin selection
//! and picks the input prefix that delivers the most. Selecting that amount
//! lands on exactly that prefix with no change, and any larger amount fails
//! selection. Outputs worth less than the fee to spend them are left out.

use tessera_types::{Satoshi, Utxo, Wei};

use crate::btc::{estimate_vsize, fee_for_vsize, selection_order};

/// `gas_price * gas_limit`, or `None` on overflow.
pub fn eth_fee(gas_price: Wei, gas_limit: u64) -> Option<Wei> {
    gas_price.checked_mul(gas_limit as u128)
}

/// Balance minus the maximum fee, floored at zero.
pub fn max_spendable_eth(balance: Wei, gas_price: Wei, gas_limit: u64) -> Wei {
    match eth_fee(gas_price, gas_limit) {
        Some(fee) => balance.saturating_sub(fee),
        None => Wei::ZERO,
    }
}

/// The largest single-recipient spend and what it costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BtcMaxSpend {
    pub value: Satoshi,
    pub fee: Satoshi,
    /// Leading outputs of the selection order it spends; zero when nothing is spendable.
    pub inputs: usize,
}

pub fn max_spend_btc(utxos: &[Utxo], fee_rate: u64, recipient_script_len: usize) -> BtcMaxSpend {
    let mut best = BtcMaxSpend {
        value: Satoshi::ZERO,
        fee: fee_for_vsize(estimate_vsize(1, &[recipient_script_len]), fee_rate),
        inputs: 0,
    };
    let mut total = Satoshi::ZERO;
    for (i, utxo) in selection_order(utxos).iter().enumerate() {
        total = total.checked_add(utxo.value).unwrap_or(Satoshi::new(u64::MAX));
        let fee = fee_for_vsize(estimate_vsize(i + 1, &[recipient_script_len]), fee_rate);
        let value = total.saturating_sub(fee);
        if value > best.value {
            best = BtcMaxSpend { value, fee, inputs: i + 1 };
        }
    }
    best
}

/// Largest amount selection can fund, floored at zero.
pub fn max_spendable_btc(utxos: &[Utxo], fee_rate: u64, recipient_script_len: usize) -> Satoshi {
    max_spend_btc(utxos, fee_rate, recipient_script_len).value
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_types::TxHash;

    fn utxo(n: u8, value: u64) -> Utxo {
        Utxo {
            txid: TxHash::new([n; 32]),
            vout: 0,
            value: Satoshi::new(value),
            confirmations: 1,
        }
    }

    #[test]
    fn eth_max_subtracts_gas() {
        assert_eq!(
            max_spendable_eth(Wei::new(1_000_000), Wei::new(10), 21_000),
            Wei::new(790_000)
        );
    }

    #[test]
    fn eth_max_floors_at_zero() {
        assert_eq!(max_spendable_eth(Wei::new(100), Wei::new(10), 21_000), Wei::ZERO);
        assert_eq!(max_spendable_eth(Wei::new(100), Wei::new(u128::MAX), 21_000), Wei::ZERO);
    }

    #[test]
    fn btc_max_spends_every_economic_output() {
        let utxos = [utxo(1, 50_000), utxo(2, 30_000)];
        // 11 + 2*68 + (9 + 22) = 178 vB at 10 sat/vB
        let max = max_spend_btc(&utxos, 10, 22);
        assert_eq!(max.fee, Satoshi::new(1_780));
        assert_eq!(max.inputs, 2);
        assert_eq!(max_spendable_btc(&utxos, 10, 22), Satoshi::new(78_220));
    }

    #[test]
    fn btc_max_skips_outputs_worth_less_than_their_fee() {
        // A 500 sat output costs 680 sat to spend at 10 sat/vB.
        let utxos = [utxo(1, 100_000), utxo(2, 500)];
        let max = max_spend_btc(&utxos, 10, 22);
        assert_eq!(max.inputs, 1);
        assert_eq!(max.fee, Satoshi::new(1_100));
        assert_eq!(max.value, Satoshi::new(98_900));

        let sel = crate::select_coins(&utxos, max.value, 10, 22, 22).unwrap();
        assert_eq!(sel.inputs.len(), 1);
        assert_eq!(sel.fee, max.fee);
        assert!(sel.change.is_zero());
        assert!(matches!(
            crate::select_coins(&utxos, Satoshi::new(max.value.raw() + 100), 10, 22, 22),
            Err(crate::TxError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn btc_max_floors_at_zero() {
        assert_eq!(max_spendable_btc(&[utxo(1, 100)], 10, 22), Satoshi::ZERO);
        assert_eq!(max_spendable_btc(&[], 10, 22), Satoshi::ZERO);
        assert_eq!(max_spend_btc(&[], 10, 22).inputs, 0);
    }
}
