//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers used across the registry and the
//! ledger. These prevent accidental identifier confusion: a `CaseId`
//! cannot be passed where a `MediatorId` is expected.
//!
//! ## Addresses
//!
//! Participants are identified by 20-byte account addresses rendered as
//! `0x` followed by 40 hex digits. Addresses are normalized to lowercase on
//! construction so that equality is byte-exact. The all-zero address is
//! representable because external data uses it as the "absent" sentinel,
//! but callers that need a real party check [`Address::is_zero`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A 20-byte account address, stored lowercase with its `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The all-zero address.
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    /// Parse and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] unless the input is `0x`
    /// (or `0X`) followed by exactly 40 hex digits.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = s.as_ref();
        let hex = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| ValidationError::InvalidAddress(raw.to_string()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    /// Build an address whose low 8 bytes encode `n`.
    ///
    /// Handy for fixtures and for well-known service identities.
    pub fn from_low_u64(n: u64) -> Self {
        Self(format!("0x{:0>40x}", n))
    }

    /// Whether this is the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential identifier of a registered mediator. Issued from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediatorId(pub u64);

/// Sequential identifier of a mediation case. Issued from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub u64);

impl MediatorId {
    /// Access the raw sequence number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl CaseId {
    /// Access the raw sequence number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MediatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mediator:{}", self.0)
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "case:{}", self.0)
    }
}

/// Domain tag used to match cases with mediators.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Category(pub u32);

impl Category {
    /// The general category, used when a case is opened without one.
    pub const GENERAL: Category = Category(0);
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "category:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_normalized_to_lowercase() {
        let a = Address::new("0xABCDEF0000000000000000000000000000000001").unwrap();
        assert_eq!(a.as_str(), "0xabcdef0000000000000000000000000000000001");
        let b = Address::new("0Xabcdef0000000000000000000000000000000001").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn address_rejects_bad_input() {
        assert!(Address::new("").is_err());
        assert!(Address::new("1230000000000000000000000000000000000000").is_err());
        assert!(Address::new("0x123").is_err());
        assert!(Address::new("0x123000000000000000000000000000000000000g").is_err());
        assert!(Address::new("0x12300000000000000000000000000000000000000").is_err());
    }

    #[test]
    fn zero_address() {
        assert!(Address::zero().is_zero());
        assert!(Address::new("0x0000000000000000000000000000000000000000")
            .unwrap()
            .is_zero());
        assert!(!Address::from_low_u64(1).is_zero());
    }

    #[test]
    fn from_low_u64_is_valid() {
        let a = Address::from_low_u64(0x1230);
        assert_eq!(a.as_str(), "0x0000000000000000000000000000000000001230");
        assert_eq!(Address::new(a.as_str()).unwrap(), a);
    }

    #[test]
    fn address_serde_rejects_invalid() {
        let ok: Address =
            serde_json::from_str("\"0x1230000000000000000000000000000000000000\"").unwrap();
        assert_eq!(ok.as_str(), "0x1230000000000000000000000000000000000000");
        assert!(serde_json::from_str::<Address>("\"not-an-address\"").is_err());
    }

    #[test]
    fn ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&MediatorId(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&CaseId(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Category(2)).unwrap(), "2");
    }

    #[test]
    fn display_prefixes() {
        assert_eq!(MediatorId(1).to_string(), "mediator:1");
        assert_eq!(CaseId(1).to_string(), "case:1");
        assert_eq!(Category::GENERAL.to_string(), "category:0");
    }
}
