//! # Swap Events
//!
//! Defines all event types that flow through the notifier bus.

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, EscrowStatus, Hash, LedgerKind, Timestamp, TxReference};

/// One successful state transition of an escrow or order record.
///
/// Creation is published as a transition with `previous == None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Ledger the record lives in.
    pub kind: LedgerKind,
    /// Record key.
    pub hashlock: Hash,
    /// Status before the transition (`None` for creation).
    pub previous: Option<EscrowStatus>,
    /// Status after the transition.
    pub current: EscrowStatus,
    /// When the ledger applied the transition.
    pub timestamp: Timestamp,
    /// Transaction that caused the transition, if any.
    pub transaction_reference: Option<TxReference>,
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SwapEvent {
    // =========================================================================
    // LEDGERS
    // =========================================================================
    /// A record changed status.
    StatusChanged(StatusTransition),

    // =========================================================================
    // CHAIN RELAYER
    // =========================================================================
    /// The relayer observed progress of a tracked transaction.
    TransactionObserved {
        /// Chain the transaction lives on.
        chain: ChainId,
        /// Transaction id.
        transaction: TxReference,
        /// Current confirmation count.
        confirmations: u64,
        /// Whether confirmation depth has been reached.
        confirmed: bool,
        /// Record the transaction funds, if correlated.
        record: Option<(LedgerKind, Hash)>,
    },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Error requiring operator attention.
    CriticalError {
        /// Component that hit the error.
        source: String,
        /// Error description.
        error: String,
    },
}

impl SwapEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::StatusChanged(t) => match t.kind {
                LedgerKind::Escrow => EventTopic::Escrow,
                LedgerKind::Order => EventTopic::Order,
            },
            Self::TransactionObserved { .. } => EventTopic::Relayer,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// The record this event concerns, if any.
    #[must_use]
    pub fn record(&self) -> Option<(LedgerKind, Hash)> {
        match self {
            Self::StatusChanged(t) => Some((t.kind, t.hashlock)),
            Self::TransactionObserved { record, .. } => *record,
            Self::CriticalError { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Escrow ledger transitions.
    Escrow,
    /// Order ledger transitions.
    Order,
    /// Chain relayer observations.
    Relayer,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Records to include. Empty means all records.
    pub records: Vec<(LedgerKind, Hash)>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            records: Vec::new(),
        }
    }

    /// Create a filter for the logical stream of one record.
    #[must_use]
    pub fn record(kind: LedgerKind, hashlock: Hash) -> Self {
        Self {
            topics: Vec::new(),
            records: vec![(kind, hashlock)],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SwapEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let record_match = self.records.is_empty()
            || event
                .record()
                .map(|r| self.records.contains(&r))
                .unwrap_or(false);

        topic_match && record_match
    }
}
