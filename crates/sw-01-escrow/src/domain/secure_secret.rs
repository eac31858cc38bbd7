//! # Secure Secret Type
//!
//! Wrapper for hashlock preimages that zeroizes memory on drop.
//!
//! ## Security
//!
//! A secret is the only thing standing between a locked record and whoever
//! learns it first. Until the claim reveals it on-chain it must not linger
//! in memory or leak through `Debug` output.

use serde::{Deserialize, Serialize};
use shared_types::{decode_hex_32, Secret, TypeError};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secure secret that zeroizes on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureSecret {
    inner: Secret,
}

impl SecureSecret {
    /// Create a new secure secret from bytes.
    pub fn new(bytes: Secret) -> Self {
        Self { inner: bytes }
    }

    /// Create from a slice (copies into fixed array).
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let inner: Secret = slice.try_into().ok()?;
        Some(Self { inner })
    }

    /// Parse a 64 digit hex string, `0x` prefix optional.
    pub fn from_hex(value: &str) -> Result<Self, TypeError> {
        decode_hex_32("secret", value).map(Self::new)
    }

    /// Get the secret bytes.
    ///
    /// Avoid keeping references to the returned slice.
    pub fn as_bytes(&self) -> &Secret {
        &self.inner
    }

    /// Copy out the raw bytes. Used only once the secret is public.
    pub fn expose(&self) -> Secret {
        self.inner
    }

    /// Lowercase hex encoding, for handing the secret to its owner.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner)
    }
}

impl PartialEq for SecureSecret {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ct_eq(&other.inner).into()
    }
}

impl Eq for SecureSecret {}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the actual secret
        f.write_str("SecureSecret(***)")
    }
}

impl Serialize for SecureSecret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SecureSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
