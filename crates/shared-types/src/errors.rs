//! # Error Types
//!
//! Parsing errors for the shared vocabulary.

use thiserror::Error;

/// Errors raised while constructing shared types from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Address was empty after trimming.
    #[error("Address must not be empty")]
    EmptyAddress,

    /// Address exceeds the accepted length.
    #[error("Address too long: {len} > {max}")]
    AddressTooLong { len: usize, max: usize },

    /// Ledger selector other than `escrow` or `order`.
    #[error("Unknown ledger kind: {0:?} (expected \"escrow\" or \"order\")")]
    UnknownLedgerKind(String),

    /// Hex field could not be decoded to the expected width.
    #[error("Invalid hex for {field}: expected {expected} bytes")]
    InvalidHex { field: &'static str, expected: usize },
}

/// Decode a fixed-width hex field, accepting an optional `0x` prefix.
pub fn decode_hex_32(field: &'static str, value: &str) -> Result<[u8; 32], TypeError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|_| TypeError::InvalidHex { field, expected: 32 })?;
    bytes
        .try_into()
        .map_err(|_| TypeError::InvalidHex { field, expected: 32 })
}
