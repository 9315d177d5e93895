//! # Escrow Amounts
//!
//! Monetary values attached to case creation and joining. Amounts are held
//! as unsigned integers in base units with [`AMOUNT_DECIMALS`] decimal
//! places, so `"0.0015"` whole units is `1_500_000_000_000_000` base units.
//!
//! ## Security Invariant
//!
//! Financial amounts are never represented as floating-point numbers.
//! Decimal strings are parsed digit by digit and rejected if they carry more
//! precision than the base unit can hold. Serialization uses the base-unit
//! integer as a string so JSON consumers never round it through a double.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of decimal places between a whole unit and a base unit.
pub const AMOUNT_DECIMALS: u32 = 18;

/// A non-negative monetary amount in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Construct from base units.
    pub fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Access the base-unit value.
    pub fn base_units(&self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Add two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Parse a decimal string denominated in whole units (e.g. `"0.0015"`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAmount`] if the string is empty,
    /// signed, contains non-digit characters, has more than
    /// [`AMOUNT_DECIMALS`] fractional digits, or overflows `u128`.
    pub fn parse_decimal(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAmount {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("only unsigned decimal digits are accepted"));
        }
        if frac.len() > AMOUNT_DECIMALS as usize {
            return Err(invalid("more fractional digits than the base unit allows"));
        }

        let scale = 10u128.pow(AMOUNT_DECIMALS);
        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| invalid("overflow"))?
        };
        let frac_units = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = AMOUNT_DECIMALS as usize);
            padded.parse::<u128>().map_err(|_| invalid("overflow"))?
        };

        whole_units
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac_units))
            .map(Amount)
            .ok_or_else(|| invalid("overflow"))
    }

    /// Render in whole units with trailing fractional zeros trimmed.
    pub fn to_decimal_string(&self) -> String {
        let scale = 10u128.pow(AMOUNT_DECIMALS);
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{frac:0>width$}", width = AMOUNT_DECIMALS as usize);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    /// Parse a base-unit integer string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidAmount {
                value: s.to_string(),
                reason: "base units must be an unsigned integer".to_string(),
            });
        }
        s.parse::<u128>()
            .map(Amount)
            .map_err(|_| ValidationError::InvalidAmount {
                value: s.to_string(),
                reason: "overflow".to_string(),
            })
    }
}

impl TryFrom<String> for Amount {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.0.to_string()
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Rendering and re-parsing a decimal string never changes the value.
        #[test]
        fn decimal_string_is_exact(units in any::<u64>()) {
            let a = Amount::from_base_units(units as u128);
            let parsed = Amount::parse_decimal(&a.to_decimal_string()).unwrap();
            prop_assert_eq!(parsed, a);
        }
    }
}
