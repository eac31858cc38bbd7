//! # Mempool View
//!
//! Local map of transactions the relayer has broadcast, so funding can be
//! tied to a ledger record before the chain confirms it.
//!
//! ## Data Structures
//!
//! - `by_id`: O(1) lookup by transaction id
//! - `by_record`: every transaction attached to a record
//!
//! Entries are kept for `retention_secs` after they were first seen, then
//! dropped by `prune()` whatever their status.

use super::entities::{ChainTransaction, RecordRef, TxId, TxStatus};
use parking_lot::RwLock;
use shared_types::Timestamp;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Indices {
    by_id: HashMap<TxId, ChainTransaction>,
    by_record: HashMap<RecordRef, Vec<TxId>>,
}

impl Indices {
    fn unlink(&mut self, tx: &ChainTransaction) {
        let Some(record) = tx.record else {
            return;
        };
        if let Some(ids) = self.by_record.get_mut(&record) {
            ids.retain(|id| id != &tx.id);
            if ids.is_empty() {
                self.by_record.remove(&record);
            }
        }
    }
}

/// Thread-safe view of relayed transactions.
#[derive(Debug)]
pub struct MempoolView {
    retention_secs: u64,
    inner: RwLock<Indices>,
}

impl MempoolView {
    /// Create an empty view.
    pub fn new(retention_secs: u64) -> Self {
        Self {
            retention_secs,
            inner: RwLock::new(Indices::default()),
        }
    }

    /// Number of tracked transactions.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Track a transaction. Re-inserting an id replaces the old entry.
    pub fn insert(&self, tx: ChainTransaction) {
        let mut inner = self.inner.write();
        if let Some(old) = inner.by_id.remove(&tx.id) {
            inner.unlink(&old);
        }
        if let Some(record) = tx.record {
            inner.by_record.entry(record).or_default().push(tx.id.clone());
        }
        inner.by_id.insert(tx.id.clone(), tx);
    }

    /// Snapshot of one transaction.
    pub fn get(&self, id: &TxId) -> Option<ChainTransaction> {
        self.inner.read().by_id.get(id).cloned()
    }

    /// Record a poll result. Returns the updated entry, or `None` if the id
    /// is not tracked.
    pub fn record_poll(
        &self,
        id: &TxId,
        status: TxStatus,
        confirmations: u64,
        now: Timestamp,
    ) -> Option<ChainTransaction> {
        let mut inner = self.inner.write();
        let tx = inner.by_id.get_mut(id)?;
        tx.status = status;
        tx.confirmations = confirmations;
        tx.last_polled = Some(now);
        Some(tx.clone())
    }

    /// Every tracked transaction attached to `record`, oldest first.
    pub fn correlate(&self, record: &RecordRef) -> Vec<ChainTransaction> {
        let inner = self.inner.read();
        let mut txs: Vec<ChainTransaction> = inner
            .by_record
            .get(record)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect();
        txs.sort_by_key(|tx| tx.first_seen);
        txs
    }

    /// Drop entries first seen at least `retention_secs` ago. Returns the
    /// ids removed.
    pub fn prune(&self, now: Timestamp) -> Vec<TxId> {
        let mut inner = self.inner.write();
        let stale: Vec<TxId> = inner
            .by_id
            .values()
            .filter(|tx| now.saturating_sub(tx.first_seen) >= self.retention_secs)
            .map(|tx| tx.id.clone())
            .collect();

        for id in &stale {
            if let Some(tx) = inner.by_id.remove(id) {
                inner.unlink(&tx);
            }
        }
        if !stale.is_empty() {
            debug!(pruned = stale.len(), "Pruned mempool view");
        }
        stale
    }
}
