//! # Secret Generation and Verification
//!
//! The hashlock scheme is plain SHA-256 over the 32 raw secret bytes, so the
//! same secret unlocks TON, EVM and Bitcoin legs alike.

use crate::domain::SecureSecret;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use shared_types::{decode_hex_32, Hash, Secret, TypeError};
use subtle::ConstantTimeEq;

/// Generate a 256-bit secret from the operating system CSPRNG.
pub fn generate_secret() -> SecureSecret {
    let mut bytes: Secret = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let secret = SecureSecret::new(bytes);
    zeroize::Zeroize::zeroize(&mut bytes);
    secret
}

/// Generate a secret together with its hashlock.
pub fn generate_pair() -> (SecureSecret, Hash) {
    let secret = generate_secret();
    let hashlock = commit(secret.as_bytes());
    (secret, hashlock)
}

/// Compute the hashlock of a secret.
pub fn commit(secret: &Secret) -> Hash {
    Sha256::digest(secret).into()
}

/// Check that `secret` is the preimage of `hashlock`.
///
/// The comparison is constant-time.
pub fn verify(secret: &Secret, hashlock: &Hash) -> bool {
    commit(secret).ct_eq(hashlock).into()
}

/// Verify untrusted byte slices. Malformed lengths fail closed.
pub fn verify_bytes(secret: &[u8], hashlock: &[u8]) -> bool {
    let (Ok(secret), Ok(hashlock)) = (
        <&Secret>::try_from(secret),
        <&Hash>::try_from(hashlock),
    ) else {
        return false;
    };
    verify(secret, hashlock)
}

/// Parse a hashlock from hex (`0x` prefix optional).
pub fn parse_hash_hex(value: &str) -> Result<Hash, TypeError> {
    decode_hex_32("hash", value)
}

/// Parse a secret from hex (`0x` prefix optional).
pub fn parse_secret_hex(value: &str) -> Result<SecureSecret, TypeError> {
    SecureSecret::from_hex(value)
}
