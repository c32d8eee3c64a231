//! Exact conversions between decimal display units and base units.
//!
//! All conversions go through integer base units, so a decimal string survives
//! `x -> base -> x` unchanged apart from trailing-zero normalisation. Strings
//! with more fractional digits than the target unit can hold are rejected
//! rather than rounded.

use crate::{Satoshi, TypesError, Wei};

pub const ETH_DECIMALS: u32 = 18;
pub const GWEI_DECIMALS: u32 = 9;
pub const BTC_DECIMALS: u32 = 8;

/// Parses a non-negative decimal string into an integer scaled by `10^decimals`.
pub fn parse_decimal(value: &str, decimals: u32) -> Result<u128, TypesError> {
    let invalid = || TypesError::InvalidAmount(value.to_string());
    let s = value.trim();

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let frac_trimmed = frac_part.trim_end_matches('0');
    if frac_trimmed.len() > decimals as usize {
        return Err(TypesError::TooPrecise {
            value: value.to_string(),
            max: decimals,
        });
    }

    let scale = 10u128.checked_pow(decimals).ok_or(TypesError::Overflow)?;
    let int_value = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<u128>().map_err(|_| TypesError::Overflow)?
    };
    let frac_value = if frac_trimmed.is_empty() {
        0
    } else {
        let padding = 10u128.pow(decimals - frac_trimmed.len() as u32);
        frac_trimmed.parse::<u128>().map_err(|_| invalid())? * padding
    };

    int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(TypesError::Overflow)
}

/// Renders an integer scaled by `10^decimals` as a minimal decimal string.
pub fn format_decimal(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let Some(scale) = 10u128.checked_pow(decimals) else {
        return value.to_string();
    };
    let int_part = value / scale;
    let frac_part = value % scale;
    if frac_part == 0 {
        return int_part.to_string();
    }
    let frac = format!("{:0width$}", frac_part, width = decimals as usize);
    format!("{}.{}", int_part, frac.trim_end_matches('0'))
}

pub fn eth_to_wei(eth: &str) -> Result<Wei, TypesError> {
    parse_decimal(eth, ETH_DECIMALS).map(Wei::new)
}

pub fn wei_to_eth(wei: Wei) -> String {
    format_decimal(wei.raw(), ETH_DECIMALS)
}

/// `"1.5"` ETH becomes `"1500000000"` gwei.
pub fn eth_to_gwei(eth: &str) -> Result<String, TypesError> {
    let wei = parse_decimal(eth, ETH_DECIMALS)?;
    Ok(format_decimal(wei, GWEI_DECIMALS))
}

pub fn gwei_to_eth(gwei: &str) -> Result<String, TypesError> {
    let wei = parse_decimal(gwei, GWEI_DECIMALS)?;
    Ok(format_decimal(wei, ETH_DECIMALS))
}

pub fn gwei_to_wei(gwei: &str) -> Result<Wei, TypesError> {
    parse_decimal(gwei, GWEI_DECIMALS).map(Wei::new)
}

pub fn btc_to_satoshi(btc: &str) -> Result<Satoshi, TypesError> {
    let raw = parse_decimal(btc, BTC_DECIMALS)?;
    u64::try_from(raw)
        .map(Satoshi::new)
        .map_err(|_| TypesError::Overflow)
}

pub fn satoshi_to_btc(sat: Satoshi) -> String {
    format_decimal(sat.raw() as u128, BTC_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_wei_conversions() {
        assert_eq!(eth_to_wei("1").unwrap(), Wei::new(1_000_000_000_000_000_000));
        assert_eq!(eth_to_wei("0.000000000000000001").unwrap(), Wei::new(1));
        assert_eq!(eth_to_wei(".5").unwrap(), Wei::new(500_000_000_000_000_000));
        assert_eq!(wei_to_eth(Wei::new(1_500_000_000_000_000_000)), "1.5");
        assert_eq!(wei_to_eth(Wei::ZERO), "0");
    }

    #[test]
    fn gwei_conversions() {
        assert_eq!(eth_to_gwei("1.5").unwrap(), "1500000000");
        assert_eq!(eth_to_gwei("0.000000000000000001").unwrap(), "0.000000001");
        assert_eq!(gwei_to_eth("1").unwrap(), "0.000000001");
        assert_eq!(gwei_to_wei("20").unwrap(), Wei::new(20_000_000_000));
    }

    #[test]
    fn btc_conversions() {
        assert_eq!(btc_to_satoshi("0.00000546").unwrap(), Satoshi::new(546));
        assert_eq!(btc_to_satoshi("21000000").unwrap(), Satoshi::new(2_100_000_000_000_000));
        assert_eq!(satoshi_to_btc(Satoshi::new(150_000_000)), "1.5");
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", ".", "-1", "1.2.3", "1e18", "abc", "0x10", " . "] {
            assert!(eth_to_wei(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_excess_precision_but_tolerates_trailing_zeros() {
        assert!(matches!(
            btc_to_satoshi("0.000000001"),
            Err(TypesError::TooPrecise { max: 8, .. })
        ));
        assert_eq!(btc_to_satoshi("0.100000000000").unwrap(), Satoshi::new(10_000_000));
    }

    #[test]
    fn overflow_is_reported() {
        let huge = "9".repeat(40);
        assert_eq!(eth_to_wei(&huge), Err(TypesError::Overflow));
    }
}
