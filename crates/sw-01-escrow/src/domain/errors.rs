//! # Domain Errors
//!
//! Error taxonomy for the escrow and order ledgers, the resolver registry and
//! the refund manager.
//!
//! | Class | Variants | Retry? |
//! |-------|----------|--------|
//! | Validation | `InvalidAmount`, `InvalidTimelock`, `InvalidSecret`, `InvalidRefundKind`, `InvalidChainPair` | never |
//! | Authorization | `Unauthorized`, `ResolverNotWhitelisted` | after registry change |
//! | State conflict | `AlreadyFunded`, `NotFunded`, `AlreadyFinalized`, `TimelockNotExpired`, `DuplicateHashlock`, `AlreadyLocked` | never |
//! | Lookup | `NotFound` | never |

use shared_types::{short_hex, Address, ChainId, EscrowStatus, Hash, Timestamp, TxReference};
use thiserror::Error;

/// Escrow error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    /// Amount must be strictly positive.
    #[error("Invalid amount: must be greater than zero")]
    InvalidAmount,

    /// Timelock must lie in the future at creation.
    #[error("Invalid timelock {timelock}: must be after {now}")]
    InvalidTimelock {
        /// Requested timelock
        timelock: Timestamp,
        /// Ledger time at creation
        now: Timestamp,
    },

    /// Same-chain order with different source and destination chains.
    #[error("Invalid chain pair for same-chain order: {source_chain} -> {destination_chain}")]
    InvalidChainPair {
        /// Source chain
        source_chain: ChainId,
        /// Destination chain
        destination_chain: ChainId,
    },

    /// Resolver is not whitelisted.
    #[error("Resolver not whitelisted: {0}")]
    ResolverNotWhitelisted(Address),

    /// Caller lacks the authority for this operation.
    #[error("Unauthorized caller: {0}")]
    Unauthorized(Address),

    /// No record for this hashlock in the addressed ledger.
    #[error("Record not found: {}", short_hex(.0))]
    NotFound(Hash),

    /// A record with this hashlock already exists.
    #[error("Duplicate hashlock: {}", short_hex(.0))]
    DuplicateHashlock(Hash),

    /// Funding attempted on a record that is no longer awaiting funds.
    #[error("Record already funded (status: {0})")]
    AlreadyFunded(EscrowStatus),

    /// Funding observed twice with different transactions.
    #[error("Record already locked by transaction {0}")]
    AlreadyLocked(TxReference),

    /// Claim attempted before the counter-leg was funded.
    #[error("Record not funded (status: {0})")]
    NotFunded(EscrowStatus),

    /// Secret does not hash to the record's hashlock.
    #[error("Invalid secret")]
    InvalidSecret,

    /// Refund attempted before the timelock.
    #[error("Timelock not expired: {now} < {timelock}")]
    TimelockNotExpired {
        /// Record timelock
        timelock: Timestamp,
        /// Time of the attempt
        now: Timestamp,
    },

    /// Record is Claimed or Refunded.
    #[error("Record already finalized (status: {0})")]
    AlreadyFinalized(EscrowStatus),

    /// Refund selector other than `escrow` or `order`.
    #[error("Invalid refund kind: {0:?} (expected \"escrow\" or \"order\")")]
    InvalidRefundKind(String),
}

impl EscrowError {
    /// Errors that depend on current record state. Definitive, never retried.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyFunded(_)
                | Self::AlreadyLocked(_)
                | Self::NotFunded(_)
                | Self::AlreadyFinalized(_)
                | Self::TimelockNotExpired { .. }
                | Self::DuplicateHashlock(_)
        )
    }

    /// Errors caused by malformed input, detected before any mutation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount
                | Self::InvalidTimelock { .. }
                | Self::InvalidChainPair { .. }
                | Self::InvalidSecret
                | Self::InvalidRefundKind(_)
        )
    }

    /// Errors caused by missing authority.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::ResolverNotWhitelisted(_))
    }

    /// Stable label for metrics and wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidTimelock { .. } => "invalid_timelock",
            Self::InvalidChainPair { .. } => "invalid_chain_pair",
            Self::ResolverNotWhitelisted(_) => "resolver_not_whitelisted",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::DuplicateHashlock(_) => "duplicate_hashlock",
            Self::AlreadyFunded(_) => "already_funded",
            Self::AlreadyLocked(_) => "already_locked",
            Self::NotFunded(_) => "not_funded",
            Self::InvalidSecret => "invalid_secret",
            Self::TimelockNotExpired { .. } => "timelock_not_expired",
            Self::AlreadyFinalized(_) => "already_finalized",
            Self::InvalidRefundKind(_) => "invalid_refund_kind",
        }
    }
}
