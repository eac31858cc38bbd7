//! # Status Wire Format
//!
//! JSON shapes pushed to external status consumers.
//!
//! ```json
//! {
//!   "type": "order_update",
//!   "data": { "orderId": "ab..", "status": "funded", "timestamp": 1700000000,
//!             "transactionReference": "0x.." },
//!   "timestamp": 1700000000
//! }
//! ```

use crate::events::{StatusTransition, SwapEvent};
use serde::{Deserialize, Serialize};
use shared_types::{hash_to_hex, EscrowStatus, LedgerKind, Timestamp};
use thiserror::Error;

/// Message type for order/escrow status updates.
pub const ORDER_UPDATE: &str = "order_update";

/// Message type for relayer observations.
pub const TRANSACTION_UPDATE: &str = "transaction_update";

/// Errors from encoding status messages.
#[derive(Debug, Error)]
pub enum BusError {
    /// JSON encoding failed.
    #[error("Failed to encode status message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The event has no external representation.
    #[error("Event is internal only: {0}")]
    NotExternal(&'static str),
}

/// Outer envelope of every status message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Message type (`order_update`, `transaction_update`).
    #[serde(rename = "type")]
    pub message_type: String,
    /// Type specific body.
    pub data: serde_json::Value,
    /// Time the message was produced.
    pub timestamp: Timestamp,
}

/// Body of an `order_update` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// Hex hashlock of the record.
    pub order_id: String,
    /// Ledger the record belongs to.
    pub kind: LedgerKind,
    /// New status.
    pub status: EscrowStatus,
    /// Time of the transition.
    pub timestamp: Timestamp,
    /// Transaction that caused the transition.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction_reference: Option<String>,
}

impl From<&StatusTransition> for OrderUpdate {
    fn from(t: &StatusTransition) -> Self {
        Self {
            order_id: hash_to_hex(&t.hashlock),
            kind: t.kind,
            status: t.current,
            timestamp: t.timestamp,
            transaction_reference: t.transaction_reference.as_ref().map(|r| r.0.clone()),
        }
    }
}

/// Body of a `transaction_update` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    /// Chain id.
    pub chain_id: i64,
    /// Transaction id.
    pub transaction_id: String,
    /// Confirmation count.
    pub confirmations: u64,
    /// Confirmation depth reached.
    pub confirmed: bool,
}

impl StatusMessage {
    /// Convert a bus event into its external message.
    ///
    /// # Errors
    ///
    /// `BusError::NotExternal` for dead-letter events.
    pub fn from_event(event: &SwapEvent, now: Timestamp) -> Result<Self, BusError> {
        match event {
            SwapEvent::StatusChanged(t) => Ok(Self {
                message_type: ORDER_UPDATE.to_string(),
                data: serde_json::to_value(OrderUpdate::from(t))?,
                timestamp: now,
            }),
            SwapEvent::TransactionObserved {
                chain,
                transaction,
                confirmations,
                confirmed,
                ..
            } => Ok(Self {
                message_type: TRANSACTION_UPDATE.to_string(),
                data: serde_json::to_value(TransactionUpdate {
                    chain_id: chain.0,
                    transaction_id: transaction.0.clone(),
                    confirmations: *confirmations,
                    confirmed: *confirmed,
                })?,
                timestamp: now,
            }),
            SwapEvent::CriticalError { .. } => Err(BusError::NotExternal("critical_error")),
        }
    }

    /// Encode as a JSON string.
    pub fn to_json(&self) -> Result<String, BusError> {
        Ok(serde_json::to_string(self)?)
    }
}
