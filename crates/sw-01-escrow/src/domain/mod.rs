//! # Domain Module
//!
//! Records, ledgers, the resolver registry and their errors.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod ledger;
pub mod registry;
pub mod secure_secret;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use ledger::{
    EscrowKind, EscrowLedger, Ledger, LedgerKindMarker, OrderKind, OrderLedger, SwapLedger,
};
pub use registry::{Resolver, ResolverRegistry};
pub use secure_secret::SecureSecret;
