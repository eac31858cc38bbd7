//! # Core Domain Entities
//!
//! Primitive types shared by the escrow ledgers, the chain relayer and the
//! notifier.
//!
//! ## Clusters
//!
//! - **Cryptography**: `Hash`, `Secret`
//! - **Identity**: `Address`
//! - **Chains**: `ChainId`, `TxReference`
//! - **Time & Value**: `Timestamp`, `Amount`

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: CRYPTOGRAPHY
// =============================================================================

/// A 32-byte SHA-256 digest. Hashlocks are values of this type.
pub type Hash = [u8; 32];

/// Raw 32-byte secret (preimage of a hashlock).
pub type Secret = [u8; 32];

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Amount in the asset's smallest denomination.
pub type Amount = u128;

/// Render a hash as lowercase hex without prefix.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Short form used in log lines (`ab12cd34..`).
pub fn short_hex(hash: &Hash) -> String {
    format!("{}..", hex::encode(&hash[..4]))
}

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

/// Opaque party identity (TON, EVM or Bitcoin address).
///
/// Addresses are compared byte-for-byte after trimming surrounding
/// whitespace; no chain-specific normalisation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Maximum accepted length. TON raw addresses are the longest we see.
    pub const MAX_LEN: usize = 128;

    /// Create an address, rejecting empty or oversized values.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptyAddress);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(TypeError::AddressTooLong {
                len: trimmed.len(),
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// =============================================================================
// CLUSTER C: CHAINS
// =============================================================================

/// Chain identifier.
///
/// Positive values are EVM chain ids; negative values denote non-EVM
/// networks (TON workchain-style ids, plus a reserved id for Bitcoin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub i64);

impl ChainId {
    /// Ethereum mainnet.
    pub const ETHEREUM: ChainId = ChainId(1);
    /// BNB Smart Chain.
    pub const BSC: ChainId = ChainId(56);
    /// Polygon PoS.
    pub const POLYGON: ChainId = ChainId(137);
    /// TON mainnet.
    pub const TON_MAINNET: ChainId = ChainId(-3);
    /// TON testnet.
    pub const TON_TESTNET: ChainId = ChainId(-239);
    /// Bitcoin (relayer leg).
    pub const BITCOIN: ChainId = ChainId(-1000);

    /// True for EVM-style chain ids.
    pub fn is_evm(&self) -> bool {
        self.0 > 0
    }

    /// True for TON networks.
    pub fn is_ton(&self) -> bool {
        matches!(*self, Self::TON_MAINNET | Self::TON_TESTNET)
    }

    /// Human readable name for logs.
    pub fn name(&self) -> &'static str {
        match *self {
            Self::ETHEREUM => "ethereum",
            Self::BSC => "bsc",
            Self::POLYGON => "polygon",
            Self::TON_MAINNET => "ton",
            Self::TON_TESTNET => "ton-testnet",
            Self::BITCOIN => "bitcoin",
            id if id.is_evm() => "evm",
            _ => "unknown",
        }
    }

    /// Default confirmation depth before a funding transaction counts.
    pub fn required_confirmations(&self) -> u64 {
        match *self {
            Self::BITCOIN => 6,
            Self::ETHEREUM => 12,
            Self::BSC => 15,
            Self::POLYGON => 128,
            Self::TON_MAINNET | Self::TON_TESTNET => 1,
            _ => 12,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// Back-reference to a transaction observed on some chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxReference(pub String);

impl TxReference {
    /// Create a reference from any string-like id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
