//! # Envelope Signatures
//!
//! Senders that act with authority share a key with the node. The sender
//! signs the envelope's canonical bytes with HMAC-SHA256 and the node
//! recomputes the tag and compares it in constant time.
//!
//! ## Canonical Bytes
//!
//! The envelope as JSON without its `signature` field, fields in declaration
//! order, payload serialized from its typed form. Whitespace and key order in
//! the JSON a client sent do not matter.
//!
//! ## Key Format
//!
//! `SWAP_SENDER_KEYS=EQadmin=<hex>,0xresolver=<hex>`. Keys are at least
//! `MIN_KEY_LEN` bytes.

use crate::entities::Address;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag.
pub const SIGNATURE_LEN: usize = 32;

/// Shortest accepted shared key.
pub const MIN_KEY_LEN: usize = 16;

/// Signature and key errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    /// The operation needs a signed envelope.
    #[error("Missing signature")]
    MissingSignature,

    /// No shared key for this sender.
    #[error("No key registered for sender {0}")]
    UnknownSender(Address),

    /// Signature is not 32 bytes of hex.
    #[error("Malformed signature: expected {SIGNATURE_LEN} bytes of hex")]
    MalformedSignature,

    /// Tag does not match.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Unusable shared key.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Envelope could not be serialized for signing.
    #[error("Envelope could not be encoded: {0}")]
    Encoding(String),
}

impl SecurityError {
    /// Stable label for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSignature => "missing_signature",
            Self::UnknownSender(_) => "unknown_sender",
            Self::MalformedSignature => "malformed_signature",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidKey(_) => "invalid_key",
            Self::Encoding(_) => "encoding_failed",
        }
    }
}

/// HMAC-SHA256 of `message_bytes` under `shared_secret`.
///
/// # Errors
///
/// `InvalidKey` if the MAC rejects the key.
pub fn sign_message(
    message_bytes: &[u8],
    shared_secret: &[u8],
) -> Result<[u8; SIGNATURE_LEN], SecurityError> {
    let mut mac = HmacSha256::new_from_slice(shared_secret)
        .map_err(|e| SecurityError::InvalidKey(e.to_string()))?;
    mac.update(message_bytes);
    let mut tag = [0u8; SIGNATURE_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Check an HMAC-SHA256 tag in constant time.
pub fn validate_hmac_signature(message_bytes: &[u8], signature: &[u8], shared_secret: &[u8]) -> bool {
    let mut mac = match HmacSha256::new_from_slice(shared_secret) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(message_bytes);
    mac.verify_slice(signature).is_ok()
}

/// Shared keys by sender.
#[derive(Clone, Default)]
pub struct SenderKeys {
    keys: HashMap<Address, Vec<u8>>,
}

impl SenderKeys {
    /// No keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace `sender`'s key.
    ///
    /// # Errors
    ///
    /// `InvalidKey` for keys shorter than `MIN_KEY_LEN`.
    pub fn insert(&mut self, sender: Address, key: impl Into<Vec<u8>>) -> Result<(), SecurityError> {
        let key = key.into();
        if key.len() < MIN_KEY_LEN {
            return Err(SecurityError::InvalidKey(format!(
                "key for {sender} is {} bytes, need at least {MIN_KEY_LEN}",
                key.len()
            )));
        }
        self.keys.insert(sender, key);
        Ok(())
    }

    /// Builder form of `insert`.
    pub fn with_key(mut self, sender: Address, key: impl Into<Vec<u8>>) -> Result<Self, SecurityError> {
        self.insert(sender, key)?;
        Ok(self)
    }

    /// Parse `sender=hexkey` pairs separated by commas.
    ///
    /// # Errors
    ///
    /// `InvalidKey` naming the first bad entry.
    pub fn parse(spec: &str) -> Result<Self, SecurityError> {
        let mut keys = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (sender, key) = entry
                .split_once('=')
                .ok_or_else(|| SecurityError::InvalidKey(format!("{entry:?}: expected sender=hexkey")))?;
            let sender = Address::new(sender)
                .map_err(|e| SecurityError::InvalidKey(format!("{entry:?}: {e}")))?;
            let key = key.trim();
            let key = hex::decode(key.strip_prefix("0x").unwrap_or(key))
                .map_err(|e| SecurityError::InvalidKey(format!("key for {sender}: {e}")))?;
            keys.insert(sender, key)?;
        }
        Ok(keys)
    }

    /// Key for `sender`.
    pub fn get(&self, sender: &Address) -> Option<&[u8]> {
        self.keys.get(sender).map(Vec::as_slice)
    }

    /// Whether `sender` has a key.
    pub fn contains(&self, sender: &Address) -> bool {
        self.keys.contains_key(sender)
    }

    /// Number of senders with a key.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// No keys at all.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for SenderKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut senders: Vec<_> = self.keys.keys().map(Address::as_str).collect();
        senders.sort_unstable();
        f.debug_struct("SenderKeys")
            .field("senders", &senders)
            .finish_non_exhaustive()
    }
}
