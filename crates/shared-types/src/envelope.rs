//! # Request Envelope
//!
//! The wrapper for every inbound request to the coordinator.
//!
//! ## Properties
//!
//! - **Versioning**: All requests include a `version` field.
//! - **Correlation**: Responses echo `correlation_id`.
//! - **Envelope Authority**: `sender` is the sole source of caller identity;
//!   payloads never repeat it. The `signature` binds it to a shared key.

use crate::entities::{Address, Timestamp};
use crate::errors::decode_hex_32;
use crate::security::{sign_message, validate_hmac_signature, SecurityError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current envelope version.
pub const ENVELOPE_VERSION: u16 = 1;

/// The universal request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope<T> {
    /// Protocol version. Checked before the payload is processed.
    pub version: u16,

    /// Caller identity. The ONLY source of truth for authorization.
    pub sender: Address,

    /// Correlates request and response.
    pub correlation_id: Uuid,

    /// Caller-side creation time (seconds).
    pub timestamp: Timestamp,

    /// The payload.
    pub payload: T,

    /// HMAC-SHA256 over every other field, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Everything the signature covers.
#[derive(Serialize)]
struct SigningView<'a, T> {
    version: u16,
    sender: &'a Address,
    correlation_id: &'a Uuid,
    timestamp: Timestamp,
    payload: &'a T,
}

impl<T> Envelope<T> {
    /// Wrap a payload with a fresh correlation id. Unsigned.
    pub fn new(sender: Address, timestamp: Timestamp, payload: T) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            sender,
            correlation_id: Uuid::new_v4(),
            timestamp,
            payload,
            signature: None,
        }
    }

    /// True if this envelope was produced by a compatible peer.
    pub fn is_supported_version(&self) -> bool {
        self.version == ENVELOPE_VERSION
    }

    /// Whether a signature is attached.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

impl<T: Serialize> Envelope<T> {
    /// Canonical bytes covered by the signature.
    ///
    /// # Errors
    ///
    /// `Encoding` if the payload cannot be serialized.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, SecurityError> {
        serde_json::to_vec(&SigningView {
            version: self.version,
            sender: &self.sender,
            correlation_id: &self.correlation_id,
            timestamp: self.timestamp,
            payload: &self.payload,
        })
        .map_err(|e| SecurityError::Encoding(e.to_string()))
    }

    /// Sign in place with the sender's shared key.
    ///
    /// # Errors
    ///
    /// `Encoding` or `InvalidKey`.
    pub fn sign(&mut self, shared_secret: &[u8]) -> Result<(), SecurityError> {
        let tag = sign_message(&self.signing_bytes()?, shared_secret)?;
        self.signature = Some(hex::encode(tag));
        Ok(())
    }

    /// Builder form of `sign`.
    ///
    /// # Errors
    ///
    /// As `sign`.
    pub fn signed(mut self, shared_secret: &[u8]) -> Result<Self, SecurityError> {
        self.sign(shared_secret)?;
        Ok(self)
    }

    /// Check the attached signature against `shared_secret`.
    ///
    /// # Errors
    ///
    /// `MissingSignature`, `MalformedSignature`, `InvalidSignature`.
    pub fn verify_signature(&self, shared_secret: &[u8]) -> Result<(), SecurityError> {
        let signature = self
            .signature
            .as_deref()
            .ok_or(SecurityError::MissingSignature)?;
        let tag = decode_hex_32("signature", signature)
            .map_err(|_| SecurityError::MalformedSignature)?;
        if validate_hmac_signature(&self.signing_bytes()?, &tag, shared_secret) {
            Ok(())
        } else {
            Err(SecurityError::InvalidSignature)
        }
    }
}
