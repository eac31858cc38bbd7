//! # SW-01 Escrow
//!
//! Hash-time-locked escrow core for cross-chain atomic swaps.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A maker locks funds behind `SHA-256(secret)` and a timelock; a whitelisted
//! resolver funds the opposite leg; the funds are then claimed with the
//! secret or refunded after expiry.
//!
//! | Guarantee | How |
//! |-----------|-----|
//! | Hashlock | SHA-256 only, constant-time verification |
//! | Monotonic status | Transitions checked against the status graph |
//! | One winner | Per-record mutex; claim and refund race, the loser sees `AlreadyFinalized` |
//! | Namespaces | Escrow and order ledgers are separate instances |
//!
//! ## Module Structure
//!
//! ```text
//! sw-01-escrow/
//! ├── domain/          # SwapRecord, Ledger<K>, ResolverRegistry, errors
//! ├── algorithms/      # Secret generation, commit, verify
//! ├── ports/           # EscrowApi, TimeSource
//! ├── refund.rs        # RefundManager
//! └── service.rs       # EscrowService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod refund;
pub mod service;

// Re-exports
pub use algorithms::{
    commit, generate_pair, generate_secret, parse_hash_hex, parse_secret_hex, verify,
    verify_bytes,
};
pub use domain::{
    CreateParams, EscrowError, EscrowKind, EscrowLedger, Ledger, LedgerKindMarker, OrderKind,
    OrderLedger, Resolver, ResolverRegistry, SecureSecret, Settlement, SettlementAction,
    SwapLedger, SwapRecord,
};
pub use ports::{EscrowApi, ManualTimeSource, SystemTimeSource, TimeSource};
pub use refund::{RefundManager, SweepReport};
pub use service::EscrowService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
