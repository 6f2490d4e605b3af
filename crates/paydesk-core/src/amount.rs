//! Monetary amounts entered by users.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest amount a single order may carry.
pub const MAX_AMOUNT: u32 = 1_000_000;

/// A validated order amount.
///
/// Always in `(0, 1_000_000]` and rounded half-up to two decimal places.
/// The only ways to obtain one are [`Amount::parse`] and `TryFrom<Decimal>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Parse raw user input. Both `.` and `,` are accepted as separator.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().replace(',', ".");
        let value = Decimal::from_str(&normalized).map_err(|_| overflow(&normalized))?;
        Self::try_from(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Classify input `Decimal` could not parse. A plain number whose integer
/// part has more digits than `Decimal` holds is out of range, not garbage.
fn overflow(normalized: &str) -> ValidationError {
    let (negative, digits) = match normalized.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, normalized.strip_prefix('+').unwrap_or(normalized)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let plain = !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());
    if !plain || int_part.trim_start_matches('0').len() <= 28 {
        return ValidationError::NotANumber;
    }
    if negative {
        ValidationError::NonPositive
    } else {
        ValidationError::TooLarge { max: MAX_AMOUNT }
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    /// The upper bound applies to the value as entered; positivity is checked
    /// after rounding, so nothing rounds down to zero.
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(ValidationError::NonPositive);
        }
        if value > Decimal::from(MAX_AMOUNT) {
            return Err(ValidationError::TooLarge { max: MAX_AMOUNT });
        }
        Ok(Self(rounded))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = rust_decimal::serde::float::deserialize(deserializer)?;
        Amount::try_from(value).map_err(serde::de::Error::custom)
    }
}
