use proptest::prelude::*;

use tessera_transactions::btc::{estimate_vsize, fee_for_vsize, select_coins, DUST_THRESHOLD};
use tessera_transactions::{max_spend_btc, max_spendable_btc, max_spendable_eth, TxError};
use tessera_types::{Satoshi, TxHash, Utxo, Wei};

/// Mixes outputs too small to pay for their own input at higher rates
/// with large ones.
fn utxo_value() -> impl Strategy<Value = u64> {
    prop_oneof![1u64..20_000, 20_000u64..5_000_000]
}

fn utxo_set() -> impl Strategy<Value = Vec<Utxo>> {
    prop::collection::vec((any::<u8>(), 0u32..4, utxo_value()), 0..12).prop_map(|items| {
        let mut seen = std::collections::BTreeSet::new();
        items
            .into_iter()
            .filter(|(n, vout, _)| seen.insert((*n, *vout)))
            .map(|(n, vout, value)| Utxo {
                txid: TxHash::new([n; 32]),
                vout,
                value: Satoshi::new(value),
                confirmations: 1,
            })
            .collect()
    })
}

proptest! {
    /// Selection is a pure function of its inputs, regardless of input order.
    #[test]
    fn selection_is_deterministic(utxos in utxo_set(), value in 546u64..10_000_000, rate in 1u64..200) {
        let mut reversed = utxos.clone();
        reversed.reverse();
        let a = select_coins(&utxos, Satoshi::new(value), rate, 22, 22);
        let b = select_coins(&reversed, Satoshi::new(value), rate, 22, 22);
        prop_assert_eq!(a, b);
    }

    /// Inputs always equal payment + fee + change, and change is never dust.
    #[test]
    fn selection_conserves_value(utxos in utxo_set(), value in 546u64..10_000_000, rate in 1u64..200) {
        if let Ok(sel) = select_coins(&utxos, Satoshi::new(value), rate, 22, 22) {
            prop_assert_eq!(sel.total.raw(), value + sel.fee.raw() + sel.change.raw());
            prop_assert!(sel.change.is_zero() || sel.change >= DUST_THRESHOLD);
            let outputs: &[usize] = if sel.change.is_zero() { &[22] } else { &[22, 22] };
            prop_assert!(sel.fee >= fee_for_vsize(estimate_vsize(sel.inputs.len(), outputs), rate));
        }
    }

    /// Spending the estimated maximum always succeeds; one satoshi more never does.
    #[test]
    fn max_spendable_btc_is_tight(utxos in utxo_set(), rate in 1u64..200) {
        let max = max_spendable_btc(&utxos, rate, 22);
        if max.raw() >= 546 {
            prop_assert!(select_coins(&utxos, max, rate, 22, 22).is_ok());
        }
        let over = Satoshi::new(max.raw() + 1);
        let over_result = select_coins(&utxos, over, rate, 22, 22);
        prop_assert!(
            matches!(over_result, Err(TxError::InsufficientFunds { .. })),
            "max + 1 should not be spendable"
        );
    }

    /// Selecting the maximum spends exactly the estimated inputs with no change
    /// and pays exactly the estimated fee.
    #[test]
    fn max_spend_matches_selection(utxos in utxo_set(), rate in 1u64..200) {
        let max = max_spend_btc(&utxos, rate, 22);
        if max.value >= DUST_THRESHOLD {
            let sel = select_coins(&utxos, max.value, rate, 22, 22).unwrap();
            prop_assert_eq!(sel.inputs.len(), max.inputs);
            prop_assert_eq!(sel.fee, max.fee);
            prop_assert!(sel.change.is_zero());
        }
    }

    /// Max spendable ETH never exceeds the balance and is exact when affordable.
    #[test]
    fn max_spendable_eth_bounds(balance in any::<u64>(), price in 0u64..1_000_000_000_000, limit in 21_000u64..1_000_000) {
        let max = max_spendable_eth(Wei::new(balance as u128), Wei::new(price as u128), limit);
        let fee = price as u128 * limit as u128;
        prop_assert!(max.raw() <= balance as u128);
        if fee <= balance as u128 {
            prop_assert_eq!(max.raw() + fee, balance as u128);
        } else {
            prop_assert_eq!(max, Wei::ZERO);
        }
    }
}
