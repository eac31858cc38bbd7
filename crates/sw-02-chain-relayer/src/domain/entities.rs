//! # Relayer Entities
//!
//! Transactions as the relayer sees them: submitted bytes, the id the chain
//! assigned, and how deep they are buried.

use serde::{Deserialize, Serialize};
use shared_types::{short_hex, ChainId, Hash, LedgerKind, Timestamp, TxReference};
use std::fmt;

/// Chain-assigned transaction id. Same representation as the reference
/// stored on ledger records.
pub type TxId = TxReference;

/// Back-reference from a transaction to the ledger record it funds or settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    /// Ledger namespace.
    pub kind: LedgerKind,
    /// Record key.
    pub hashlock: Hash,
}

impl RecordRef {
    /// Reference a record.
    pub fn new(kind: LedgerKind, hashlock: Hash) -> Self {
        Self { kind, hashlock }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), short_hex(&self.hashlock))
    }
}

/// Lifecycle of a relayed transaction.
///
/// ```text
/// [Pending] ──accepted──→ [Broadcast] ──depth reached──→ [Confirmed]
///     │                        │
///     └────────rejected────────┴──────dropped──────────→ [Failed]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Built locally, not yet accepted by the network.
    #[default]
    Pending,
    /// Accepted by the network, below the required depth.
    Broadcast,
    /// At or beyond the required depth.
    Confirmed,
    /// Rejected or dropped.
    Failed,
}

impl TxStatus {
    /// Confirmed and Failed end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Failed)
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Broadcast => "broadcast",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed transaction handed to the relayer for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingTransaction {
    /// Serialized signed transaction.
    pub raw: Vec<u8>,
    /// Fee paid, in the chain's smallest unit.
    pub fee: u64,
    /// Record this transaction funds or settles, if any.
    pub record: Option<RecordRef>,
}

impl OutgoingTransaction {
    /// A transaction with no record attached.
    pub fn new(raw: Vec<u8>, fee: u64) -> Self {
        Self {
            raw,
            fee,
            record: None,
        }
    }

    /// Attach a record back-reference.
    pub fn for_record(mut self, record: RecordRef) -> Self {
        self.record = Some(record);
        self
    }
}

/// A broadcast transaction tracked in the mempool view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    /// Chain-assigned id.
    pub id: TxId,
    /// Chain it was submitted to.
    pub chain: ChainId,
    /// Serialized signed transaction.
    pub raw: Vec<u8>,
    /// Current lifecycle status.
    pub status: TxStatus,
    /// Fee paid.
    pub fee: u64,
    /// Blocks on top of (and including) the confirming block.
    pub confirmations: u64,
    /// When the relayer first saw it.
    pub first_seen: Timestamp,
    /// Last successful status poll.
    pub last_polled: Option<Timestamp>,
    /// Record back-reference.
    pub record: Option<RecordRef>,
}

impl ChainTransaction {
    /// Track a transaction that the network just accepted.
    pub fn broadcast(id: TxId, chain: ChainId, tx: OutgoingTransaction, now: Timestamp) -> Self {
        Self {
            id,
            chain,
            raw: tx.raw,
            status: TxStatus::Broadcast,
            fee: tx.fee,
            confirmations: 0,
            first_seen: now,
            last_polled: None,
            record: tx.record,
        }
    }
}

/// Status change reported by a polling task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationUpdate {
    /// Transaction being watched.
    pub id: TxId,
    /// Chain it lives on.
    pub chain: ChainId,
    /// Status after this poll.
    pub status: TxStatus,
    /// Depth after this poll.
    pub confirmations: u64,
    /// Record back-reference from the mempool view, if tracked.
    pub record: Option<RecordRef>,
}

impl ConfirmationUpdate {
    /// Whether this is the last update the task will send.
    pub fn is_final(&self) -> bool {
        self.status.is_terminal()
    }
}
