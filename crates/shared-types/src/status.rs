//! # Ledger Kinds and Escrow Status
//!
//! The status vocabulary is shared by both ledgers and by the notifier, so it
//! lives here rather than in the escrow subsystem.

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which ledger a record belongs to.
///
/// The two ledgers share no namespace guarantee: the same hashlock may exist
/// in both with unrelated meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// Cross-chain escrow leg.
    Escrow,
    /// Same-chain order leg.
    Order,
}

impl LedgerKind {
    /// Selector string used on the wire and in the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Escrow => "escrow",
            Self::Order => "order",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerKind {
    type Err = TypeError;

    /// Exact, case-sensitive match. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "escrow" => Ok(Self::Escrow),
            "order" => Ok(Self::Order),
            other => Err(TypeError::UnknownLedgerKind(other.to_string())),
        }
    }
}

/// Escrow/order lifecycle status.
///
/// ```text
/// Created ──observe──→ Locked ──confirm──→ Funded ──claim──→ Claimed
///    │                   │                   │
///    └───────────────────┴──── expiry ───────┴──────────→ Refunded
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    /// Maker's funds locked in the record; no counter-leg yet.
    #[default]
    Created,
    /// Funding transaction observed but not yet at confirmation depth.
    Locked,
    /// Counter-leg funded by a resolver.
    Funded,
    /// Secret revealed, funds released.
    Claimed,
    /// Timelock expired, funds returned.
    Refunded,
}

impl EscrowStatus {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: EscrowStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Locked)
                | (Self::Created, Self::Funded)
                | (Self::Created, Self::Refunded)
                | (Self::Locked, Self::Funded)
                | (Self::Locked, Self::Refunded)
                | (Self::Funded, Self::Claimed)
                | (Self::Funded, Self::Refunded)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed | Self::Refunded)
    }

    /// Status still awaiting its counter-leg.
    pub fn is_unfunded(&self) -> bool {
        matches!(self, Self::Created | Self::Locked)
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Locked => "locked",
            Self::Funded => "funded",
            Self::Claimed => "claimed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
