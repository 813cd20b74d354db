// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conversion between the chain's base unit (wei) and its display unit (ether).

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
};

use alloy_primitives::{utils::format_units, I256, U256};
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Number of decimals between the base unit and the display unit.
pub const DISPLAY_DECIMALS: u8 = 18;

/// Base units per display unit, as a float.
pub const WEI_PER_ETHER: f64 = 1e18;

/// Magnitude at or above which a native number is taken to be in base units.
pub const DEFAULT_SCALE_THRESHOLD: f64 = 1e15;

/// Fractional digits kept by [Wei::percent_of] before converting to a float.
const PERCENT_PRECISION: f64 = 1e12;

/// `100 * 10^12`: percent, shifted by [PERCENT_PRECISION].
const PERCENT_SCALE: u64 = 100_000_000_000_000;

/// Signed amount in the chain's base unit.
///
/// Held as a 256-bit integer so that sums and differences of upstream values are exact; only
/// [Wei::ether] rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(I256);

impl Wei {
    pub const ZERO: Wei = Wei(I256::ZERO);

    /// Parse a base-10 integer string, with an optional leading `-`.
    pub fn parse(text: &str) -> Result<Self, AnalyticsError> {
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnalyticsError::MalformedNumericInput(text.to_string()));
        }
        let magnitude = U256::from_str_radix(digits, 10)
            .map_err(|_| AnalyticsError::MalformedNumericInput(text.to_string()))?;
        // Negative values reach one further than positive ones: -2^255 is I256::MIN.
        let limit = if negative { I256::MIN.into_raw() } else { I256::MAX.into_raw() };
        if magnitude > limit {
            return Err(AnalyticsError::MalformedNumericInput(text.to_string()));
        }
        Ok(Self::from_parts(negative, magnitude))
    }

    /// Convert a display-scale value into base units, rounding to the nearest wei.
    pub fn from_ether(value: f64) -> Self {
        Self::from_base_float(value * WEI_PER_ETHER)
    }

    /// Convert a float that already counts base units, rounding to the nearest wei.
    ///
    /// Magnitudes beyond `u128::MAX` saturate.
    pub fn from_base_float(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        let magnitude = U256::from(value.abs().round() as u128);
        Self::from_parts(value.is_sign_negative(), magnitude)
    }

    fn from_parts(negative: bool, magnitude: U256) -> Self {
        let value = I256::from_raw(magnitude);
        if negative {
            Self(value.wrapping_neg())
        } else {
            Self(value)
        }
    }

    /// Display-scale value of this amount (divided by 10^18).
    pub fn ether(self) -> f64 {
        // format_units renders the exact decimal expansion, so parsing it rounds once.
        format_units(self.0, DISPLAY_DECIMALS)
            .ok()
            .and_then(|text| text.parse::<f64>().ok())
            .unwrap_or_default()
    }

    /// `self / whole * 100`, divided on the integers so exact ratios stay exact.
    ///
    /// `None` when `whole` is zero. Falls back to float division when the scaled quotient does
    /// not fit.
    pub fn percent_of(self, whole: Wei) -> Option<f64> {
        if whole.is_zero() {
            return None;
        }
        let scaled = self
            .0
            .checked_mul(Wei::from(PERCENT_SCALE).0)
            .and_then(|numerator| numerator.checked_div(whole.0))
            .and_then(|quotient| i128::try_from(quotient).ok());
        Some(match scaled {
            Some(quotient) => quotient as f64 / PERCENT_PRECISION,
            None => self.ether() / whole.ether() * 100.0,
        })
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_positive()
    }

    /// Absolute distance between two amounts.
    pub fn abs_diff(self, other: Wei) -> Wei {
        let diff = self.0 - other.0;
        if diff.is_negative() {
            Wei(-diff)
        } else {
            Wei(diff)
        }
    }

    pub fn into_inner(self) -> I256 {
        self.0
    }
}

impl From<I256> for Wei {
    fn from(value: I256) -> Self {
        Self(value)
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Self(I256::from_raw(U256::from(value)))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Wei {
    type Output = Wei;

    fn add(self, rhs: Wei) -> Wei {
        Wei(self.0 + rhs.0)
    }
}

impl AddAssign for Wei {
    fn add_assign(&mut self, rhs: Wei) {
        self.0 = self.0 + rhs.0;
    }
}

impl Sub for Wei {
    type Output = Wei;

    fn sub(self, rhs: Wei) -> Wei {
        Wei(self.0 - rhs.0)
    }
}

impl Neg for Wei {
    type Output = Wei;

    fn neg(self) -> Wei {
        Wei(-self.0)
    }
}

impl Sum for Wei {
    fn sum<I: Iterator<Item = Wei>>(iter: I) -> Wei {
        iter.fold(Wei::ZERO, |acc, value| acc + value)
    }
}

/// A numeric field as it arrives from the upstream JSON document.
///
/// Decimal strings are always raw base units. Native numbers are ambiguous: they may be raw base
/// units or already scaled, and a [ScaleStrategy] decides which.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Text(String),
    Number(f64),
}

impl Default for RawAmount {
    fn default() -> Self {
        RawAmount::Text("0".to_string())
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

/// Strategy resolving a [RawAmount] into base units.
///
/// Kept behind a trait so the magnitude heuristic can be replaced by an explicit unit tag once
/// the upstream schema carries one.
pub trait ScaleStrategy {
    fn resolve(&self, amount: &RawAmount) -> Result<Wei, AnalyticsError>;
}

/// Treat native numbers at or above `threshold` as raw base units and anything below as
/// already display-scale.
///
/// This is a heuristic. Large display-scale aggregates (e.g. the summed balance of more than
/// ~30 million validators) or tiny raw amounts below 0.001 ether are misclassified.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MagnitudeThreshold {
    pub threshold: f64,
}

impl Default for MagnitudeThreshold {
    fn default() -> Self {
        Self { threshold: DEFAULT_SCALE_THRESHOLD }
    }
}

impl ScaleStrategy for MagnitudeThreshold {
    fn resolve(&self, amount: &RawAmount) -> Result<Wei, AnalyticsError> {
        match amount {
            RawAmount::Text(text) => Wei::parse(text),
            RawAmount::Number(value) if value.abs() >= self.threshold => {
                Ok(Wei::from_base_float(*value))
            }
            RawAmount::Number(value) => Ok(Wei::from_ether(*value)),
        }
    }
}

/// Every native number is display-scale; only decimal strings carry base units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StringsAreBaseUnits;

impl ScaleStrategy for StringsAreBaseUnits {
    fn resolve(&self, amount: &RawAmount) -> Result<Wei, AnalyticsError> {
        match amount {
            RawAmount::Text(text) => Wei::parse(text),
            RawAmount::Number(value) => Ok(Wei::from_ether(*value)),
        }
    }
}

/// Convert an upstream numeric field to display scale using the default heuristic.
pub fn to_display_unit(amount: &RawAmount) -> Result<f64, AnalyticsError> {
    Ok(MagnitudeThreshold::default().resolve(amount)?.ether())
}

/// Scale a native balance figure whose unit is unknown.
///
/// The network overview reports balances in wei, gwei or ether depending on the endpoint:
/// values above 1e15 are wei, values above 1e6 are gwei, anything else is ether.
pub fn scale_balance(value: f64) -> f64 {
    if value > DEFAULT_SCALE_THRESHOLD {
        value / WEI_PER_ETHER
    } else if value > 1e6 {
        value / 1e9
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_beyond_u64() {
        let wei = Wei::parse("123456789012345678901234567890").unwrap();
        assert_eq!(wei.to_string(), "123456789012345678901234567890");
        assert!((wei.ether() - 123456789012.34567).abs() < 1e-3);
    }

    #[test]
    fn parses_negative_and_padded_values() {
        assert_eq!(Wei::parse("-1000000000000000000").unwrap().ether(), -1.0);
        assert_eq!(Wei::parse(" 42 ").unwrap(), Wei::from(42u64));
    }

    #[test]
    fn rejects_non_integers() {
        for bad in ["", "-", "1.5", "0x10", "12a", "1e18"] {
            assert_eq!(
                Wei::parse(bad),
                Err(AnalyticsError::MalformedNumericInput(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_values_outside_i256() {
        const MAX: &str =
            "57896044618658097711785492504343953926634992332820282019728792003956564819967";
        const TWO_POW_255: &str =
            "57896044618658097711785492504343953926634992332820282019728792003956564819968";
        const U256_MAX: &str =
            "115792089237316195423570985008687907853269984665640564039457584007913129639935";

        assert_eq!(Wei::parse(MAX).unwrap(), Wei::from(I256::MAX));
        assert_eq!(Wei::parse(&format!("-{TWO_POW_255}")).unwrap(), Wei::from(I256::MIN));
        assert_eq!(Wei::parse(&format!("-{MAX}")).unwrap(), Wei::from(-I256::MAX));
        for bad in [TWO_POW_255.to_string(), U256_MAX.to_string(), format!("-{U256_MAX}")] {
            assert_eq!(Wei::parse(&bad), Err(AnalyticsError::MalformedNumericInput(bad.clone())));
        }
        let below_min =
            "-57896044618658097711785492504343953926634992332820282019728792003956564819969";
        assert!(Wei::parse(below_min).is_err());
    }

    #[test]
    fn percent_of_is_exact_for_exact_ratios() {
        let whole = Wei::parse("21000000000000000").unwrap();
        let part = Wei::parse("20790000000000000").unwrap();
        assert_eq!(part.percent_of(whole), Some(99.0));
        let third = Wei::from(1u64).percent_of(Wei::from(3u64)).unwrap();
        assert!((third - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(Wei::from(5u64).percent_of(Wei::ZERO), None);
        assert_eq!(Wei::parse("-5").unwrap().percent_of(Wei::from(10u64)), Some(-50.0));
    }

    #[test]
    fn display_conversion() {
        assert_eq!(to_display_unit(&"32000000000000000".into()).unwrap(), 0.032);
        assert_eq!(to_display_unit(&"0".into()).unwrap(), 0.0);
    }

    #[test]
    fn magnitude_heuristic() {
        // Below the threshold the number is already in ether.
        assert_eq!(to_display_unit(&0.5.into()).unwrap(), 0.5);
        assert_eq!(to_display_unit(&32.0.into()).unwrap(), 32.0);
        // At and above the threshold it is raw wei.
        assert_eq!(to_display_unit(&1e15.into()).unwrap(), 0.001);
        assert_eq!(to_display_unit(&32e18.into()).unwrap(), 32.0);
    }

    #[test]
    fn strings_are_base_units_strategy() {
        let strategy = StringsAreBaseUnits;
        assert_eq!(strategy.resolve(&1e15.into()).unwrap().ether(), 1e15);
        assert_eq!(strategy.resolve(&"1000".into()).unwrap(), Wei::from(1000u64));
    }

    #[test]
    fn arithmetic_is_exact() {
        let a = Wei::parse("100000000000000001").unwrap();
        let b = Wei::parse("99999999999999999").unwrap();
        assert_eq!(a - b, Wei::from(2u64));
        assert_eq!(b.abs_diff(a), Wei::from(2u64));
        assert_eq!([a, b].into_iter().sum::<Wei>(), Wei::parse("200000000000000000").unwrap());
    }

    #[test]
    fn balance_scaling() {
        assert_eq!(scale_balance(32e18), 32.0);
        assert_eq!(scale_balance(32e9), 32.0);
        assert_eq!(scale_balance(32.0), 32.0);
    }
}
