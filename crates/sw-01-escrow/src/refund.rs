//! # Refund Manager
//!
//! Single entry point for refunds across both ledgers. The caller names the
//! ledger explicitly; there is no guessing from the hashlock, since the same
//! hashlock may exist in both.

use crate::domain::{EscrowError, EscrowLedger, OrderLedger, Settlement, SwapLedger};
use shared_types::{short_hex, Hash, LedgerKind, Timestamp};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one expiry sweep over a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Ledger swept.
    pub kind: LedgerKind,
    /// Records refunded by this sweep.
    pub refunded: Vec<Settlement>,
    /// Records finalized by someone else between listing and refunding.
    pub lost_races: usize,
    /// Records that failed for any other reason.
    pub failed: Vec<(Hash, EscrowError)>,
}

impl SweepReport {
    fn new(kind: LedgerKind) -> Self {
        Self {
            kind,
            refunded: Vec::new(),
            lost_races: 0,
            failed: Vec::new(),
        }
    }
}

/// Routes refunds to the escrow or order ledger.
pub struct RefundManager {
    escrow: Arc<EscrowLedger>,
    order: Arc<OrderLedger>,
}

impl RefundManager {
    /// Create a manager over both ledgers.
    pub fn new(escrow: Arc<EscrowLedger>, order: Arc<OrderLedger>) -> Self {
        Self { escrow, order }
    }

    /// Parse the caller's ledger selector.
    ///
    /// # Errors
    ///
    /// `InvalidRefundKind` for anything but `escrow` or `order`.
    pub fn parse_kind(kind: &str) -> Result<LedgerKind, EscrowError> {
        kind.parse()
            .map_err(|_| EscrowError::InvalidRefundKind(kind.to_string()))
    }

    /// The ledger for `kind`.
    pub fn ledger(&self, kind: LedgerKind) -> &dyn SwapLedger {
        match kind {
            LedgerKind::Escrow => self.escrow.as_ref(),
            LedgerKind::Order => self.order.as_ref(),
        }
    }

    /// Refund `hashlock` in the ledger named by `kind`.
    ///
    /// The selector is validated before the ledger is touched.
    pub fn refund(
        &self,
        kind: &str,
        hashlock: &Hash,
        now: Timestamp,
    ) -> Result<Settlement, EscrowError> {
        let kind = Self::parse_kind(kind)?;
        self.refund_kind(kind, hashlock, now)
    }

    /// Refund with an already parsed selector.
    pub fn refund_kind(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        now: Timestamp,
    ) -> Result<Settlement, EscrowError> {
        self.ledger(kind).refund(hashlock, now)
    }

    /// Refund every record of `kind` that is expired and not yet final.
    ///
    /// A record claimed concurrently counts as a lost race, not a failure.
    pub fn refund_expired(&self, kind: LedgerKind, now: Timestamp) -> SweepReport {
        let ledger = self.ledger(kind);
        let mut report = SweepReport::new(kind);

        for hashlock in ledger.expired(now) {
            match ledger.refund(&hashlock, now) {
                Ok(settlement) => report.refunded.push(settlement),
                Err(EscrowError::AlreadyFinalized(status)) => {
                    debug!(kind = %kind, hashlock = %short_hex(&hashlock), %status, "Sweep lost race");
                    report.lost_races += 1;
                }
                Err(e) => {
                    warn!(kind = %kind, hashlock = %short_hex(&hashlock), error = %e, "Sweep refund failed");
                    report.failed.push((hashlock, e));
                }
            }
        }

        if !report.refunded.is_empty() {
            info!(
                kind = %kind,
                refunded = report.refunded.len(),
                lost_races = report.lost_races,
                "Expired records refunded"
            );
        }
        report
    }
}
