//! # Error Types
//!
//! Validation failures raised while constructing core primitives from
//! untrusted input (request bodies, database rows, configuration).

use thiserror::Error;

/// A value could not be parsed into a core primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hex digits.
    #[error("invalid address {0:?}: expected 0x followed by 40 hex digits")]
    InvalidAddress(String),

    /// Amount string is empty, signed, malformed, or too precise.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp is not RFC 3339 UTC.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Identifier is outside the issued range (ids start at 1).
    #[error("invalid identifier {0}: identifiers start at 1")]
    InvalidIdentifier(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_address_display() {
        let err = ValidationError::InvalidAddress("0xzz".to_string());
        assert!(format!("{err}").contains("0xzz"));
    }

    #[test]
    fn invalid_amount_display() {
        let err = ValidationError::InvalidAmount {
            value: "-1".to_string(),
            reason: "negative".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("-1"));
        assert!(msg.contains("negative"));
    }
}
