//! # Money Module
//!
//! Integer-cent monetary values for batch costs and selling prices.
//!
//! Request bodies may give a price either as integer cents (`4500`) or as a
//! decimal string (`"45.00"`); [`deserialize_cents`] accepts both.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Batch: 3 units at 0.10 + 0.20 per unit in floating point               │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Integer cents: 10 + 20 = 30, × 3 = 90. Always exact.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let cost = Money::from_cents(450);
//! let price = Money::parse_decimal("7.99").unwrap();
//!
//! assert_eq!(price.cents(), 799);
//! assert_eq!(cost.multiply_quantity(10).to_string(), "45.00");
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;

/// A monetary value in cents. Negative values are allowed for adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Unit price times a unit count.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a decimal amount such as `"12"`, `"12.5"`, or `"12.50"`.
    ///
    /// More than two fractional digits is rejected rather than rounded.
    pub fn parse_decimal(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        let invalid = || ValidationError::invalid("price", format!("'{}' is not an amount", input));

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty()
            || minor.len() > 2
            || !major.bytes().all(|b| b.is_ascii_digit())
            || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let major: i64 = major.parse().map_err(|_| invalid())?;
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => minor.parse().map_err(|_| invalid())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Margin of `self` (selling price) over `cost` in basis points of cost.
    ///
    /// Returns `None` when cost is zero or negative.
    pub fn markup_bps(&self, cost: Money) -> Option<i64> {
        if cost.0 <= 0 {
            return None;
        }
        Some(((self.0 - cost.0) as i128 * 10_000 / cost.0 as i128) as i64)
    }
}

/// Plain decimal with two places, no currency symbol. The shop's currency is
/// a display concern of the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Cents(i64),
    Decimal(String),
}

impl Amount {
    fn into_cents(self) -> Result<i64, ValidationError> {
        match self {
            Amount::Cents(cents) => Ok(cents),
            Amount::Decimal(text) => Money::parse_decimal(&text).map(|m| m.cents()),
        }
    }
}

/// Serde helper for `*_cents` fields: integer cents or a decimal string.
pub fn deserialize_cents<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Amount::deserialize(de)?
        .into_cents()
        .map_err(serde::de::Error::custom)
}

/// Like [`deserialize_cents`] for optional patch fields. Use with `#[serde(default)]`.
pub fn deserialize_cents_opt<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Amount>::deserialize(de)?
        .map(Amount::into_cents)
        .transpose()
        .map_err(serde::de::Error::custom)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse_decimal("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse_decimal(" 0.07 ").unwrap().cents(), 7);
        assert_eq!(Money::parse_decimal("-3.10").unwrap().cents(), -310);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("1.999").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal(".50").is_err());
        assert!(Money::parse_decimal("1.-5").is_err());
    }

    #[derive(Debug, Deserialize)]
    struct PriceInput {
        #[serde(deserialize_with = "deserialize_cents")]
        price_cents: i64,
        #[serde(default, deserialize_with = "deserialize_cents_opt")]
        cost_cents: Option<i64>,
    }

    #[test]
    fn test_prices_accept_cents_or_decimal_strings() {
        let cents: PriceInput = serde_json::from_str(r#"{"price_cents": 4500}"#).unwrap();
        assert_eq!(cents.price_cents, 4500);
        assert_eq!(cents.cost_cents, None);

        let decimal: PriceInput =
            serde_json::from_str(r#"{"price_cents": "45.5", "cost_cents": "20.00"}"#).unwrap();
        assert_eq!(decimal.price_cents, 4550);
        assert_eq!(decimal.cost_cents, Some(2000));

        let bad = serde_json::from_str::<PriceInput>(r#"{"price_cents": "4.999"}"#).unwrap_err();
        assert!(bad.to_string().contains("not an amount"));
    }

    #[test]
    fn test_markup() {
        let cost = Money::from_cents(400);
        assert_eq!(Money::from_cents(500).markup_bps(cost), Some(2500));
        assert_eq!(Money::from_cents(300).markup_bps(cost), Some(-2500));
        assert_eq!(Money::from_cents(500).markup_bps(Money::from_cents(0)), None);
    }
}
