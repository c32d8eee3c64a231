//! Exchange rates and network fee rates served by the transaction service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Timestamp;

/// Conversion rate from one currency code to another, e.g. `ETH -> USD`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    /// Decimal string as quoted by the service.
    pub value: String,
    #[serde(default)]
    pub valid_to: Option<Timestamp>,
    pub timestamp: Timestamp,
}

/// Rates indexed by `from` then `to` currency code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRates(BTreeMap<String, BTreeMap<String, ExchangeRate>>);

impl ExchangeRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rate: ExchangeRate) {
        self.0
            .entry(rate.from.to_uppercase())
            .or_default()
            .insert(rate.to.to_uppercase(), rate);
    }

    /// Lookup is case-insensitive on both currency codes.
    pub fn get(&self, from: &str, to: &str) -> Option<&ExchangeRate> {
        self.0.get(&from.to_uppercase())?.get(&to.to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.0.values().flat_map(BTreeMap::values)
    }
}

impl FromIterator<ExchangeRate> for ExchangeRates {
    fn from_iter<I: IntoIterator<Item = ExchangeRate>>(iter: I) -> Self {
        let mut rates = Self::new();
        for rate in iter {
            rates.insert(rate);
        }
        rates
    }
}

/// Terms the service applies when exchanging one currency for another.
///
/// Amounts and rates are decimal strings in the `from` currency, as quoted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSetting {
    pub id: String,
    pub from: String,
    pub to: String,
    /// Where the outgoing leg of an exchange is paid.
    pub deposit_address: String,
    pub min_exchange_amount: String,
    pub outgoing_fee_rate: String,
    pub exchange_fee_rate: String,
    /// Flat fee charged on the return leg, in the `to` currency.
    pub return_fee: String,
    pub timestamp: Timestamp,
}

/// Settings indexed by `from` then `to` currency code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSettings(BTreeMap<String, BTreeMap<String, ExchangeSetting>>);

impl ExchangeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, setting: ExchangeSetting) {
        self.0
            .entry(setting.from.to_uppercase())
            .or_default()
            .insert(setting.to.to_uppercase(), setting);
    }

    /// Lookup is case-insensitive on both currency codes.
    pub fn get(&self, from: &str, to: &str) -> Option<&ExchangeSetting> {
        self.0.get(&from.to_uppercase())?.get(&to.to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ExchangeSetting> for ExchangeSettings {
    fn from_iter<I: IntoIterator<Item = ExchangeSetting>>(iter: I) -> Self {
        let mut settings = Self::new();
        for setting in iter {
            settings.insert(setting);
        }
        settings
    }
}

/// Window covered by a series of historical rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeInterval {
    pub const ALL: [TimeInterval; 6] = [
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Quarter,
        Self::Year,
    ];
}

/// Rate series per interval, then `from` and `to` currency code, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalExchangeRates(BTreeMap<TimeInterval, BTreeMap<String, BTreeMap<String, Vec<ExchangeRate>>>>);

impl HistoricalExchangeRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rate` to its series and keep the series ordered by timestamp.
    pub fn push(&mut self, interval: TimeInterval, rate: ExchangeRate) {
        let series = self
            .0
            .entry(interval)
            .or_default()
            .entry(rate.from.to_uppercase())
            .or_default()
            .entry(rate.to.to_uppercase())
            .or_default();
        series.push(rate);
        series.sort_by_key(|r| r.timestamp);
    }

    /// The series for one currency pair; empty when the service had none.
    pub fn series(&self, interval: TimeInterval, from: &str, to: &str) -> &[ExchangeRate] {
        self.0
            .get(&interval)
            .and_then(|pairs| pairs.get(&from.to_uppercase()))
            .and_then(|targets| targets.get(&to.to_uppercase()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSpeed {
    Slow,
    Average,
    Fast,
}

/// Fee rate tiers for one chain: wei per gas on Ethereum, sat/vB on Bitcoin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub slow: u128,
    pub average: u128,
    pub fast: u128,
    /// Expected confirmation times in seconds, same order as the rates.
    pub slow_time_secs: u64,
    pub average_time_secs: u64,
    pub fast_time_secs: u64,
    #[serde(default)]
    pub source: String,
}

impl FeeRates {
    pub fn rate(&self, speed: FeeSpeed) -> u128 {
        match speed {
            FeeSpeed::Slow => self.slow,
            FeeSpeed::Average => self.average,
            FeeSpeed::Fast => self.fast,
        }
    }
}
