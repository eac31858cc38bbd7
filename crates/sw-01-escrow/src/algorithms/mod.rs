//! # Algorithms Module
//!
//! Secret generation and hashlock verification.

pub mod secret;

pub use secret::{
    commit, generate_pair, generate_secret, parse_hash_hex, parse_secret_hex, verify,
    verify_bytes,
};
