//! # Funding Watcher
//!
//! Connects the chain relayer to the ledgers. A resolver's funding
//! transaction is broadcast, the record is marked `Locked`, and once the
//! transaction reaches confirmation depth the record is funded.
//!
//! The funder is checked against the record before anything reaches the
//! chain: it must be whitelisted, match a named resolver, and be the funder
//! that already locked the record, if any.
//!
//! ```text
//! submit_funding ──check_lock──→ broadcast ──→ mark_locked ──watch──→ [poll task]
//! track_funding  ─────────────────────────────→ mark_locked ──watch──↗
//!                                                          │ ConfirmationUpdate
//!                                                          ▼
//!                         bus ←── TransactionObserved ── run loop ──Confirmed──→ fund
//! ```
//!
//! Pollers for a record are cancelled as soon as the record is claimed or
//! refunded.

use parking_lot::Mutex;
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, Subscription, SwapEvent};
use shared_types::{short_hex, Address};
use std::collections::HashMap;
use std::sync::Arc;
use sw_01_escrow::{EscrowApi, EscrowError, EscrowService};
use sw_02_chain_relayer::{
    ChainRelayer, ConfirmationUpdate, OutgoingTransaction, PollHandle, RecordRef, RelayerError,
    TxId, TxStatus,
};
use swap_telemetry::log_tx_event;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Update channel depth.
const UPDATE_BUFFER: usize = 256;

/// Funding failures.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// Transaction has no record attached.
    #[error("Funding transaction is not attached to a record")]
    Uncorrelated,

    /// Broadcast failed.
    #[error(transparent)]
    Relayer(#[from] RelayerError),

    /// Ledger rejected the transition.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// `spawn` was called twice.
    #[error("Funding watcher already running")]
    AlreadyRunning,
}

struct Tracked {
    record: RecordRef,
    funder: Address,
    _poller: PollHandle,
}

/// Drives funding transactions to ledger transitions.
pub struct FundingWatcher {
    relayer: ChainRelayer,
    escrow: Arc<EscrowService>,
    bus: Arc<InMemoryEventBus>,
    updates: mpsc::Sender<ConfirmationUpdate>,
    receiver: Mutex<Option<mpsc::Receiver<ConfirmationUpdate>>>,
    tracked: Mutex<HashMap<TxId, Tracked>>,
}

impl FundingWatcher {
    /// Create a watcher. Nothing is processed until `spawn`.
    pub fn new(
        relayer: ChainRelayer,
        escrow: Arc<EscrowService>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        let (updates, receiver) = mpsc::channel(UPDATE_BUFFER);
        Self {
            relayer,
            escrow,
            bus,
            updates,
            receiver: Mutex::new(Some(receiver)),
            tracked: Mutex::new(HashMap::new()),
        }
    }

    /// The relayer funding transactions go through.
    pub fn relayer(&self) -> &ChainRelayer {
        &self.relayer
    }

    /// Broadcast a funding transaction, mark its record `Locked` and start
    /// watching it.
    ///
    /// # Errors
    ///
    /// `Uncorrelated` without a record. Before broadcasting: `Escrow` when
    /// the record is unknown, past `Locked`, or `funder` may not fund it.
    /// `Relayer` when the broadcast fails, `Escrow` when the ledger refuses
    /// the lock afterwards.
    pub async fn submit_funding(
        &self,
        tx: OutgoingTransaction,
        funder: Address,
    ) -> Result<TxId, WatcherError> {
        let record = tx.record.ok_or(WatcherError::Uncorrelated)?;
        self.escrow
            .check_lock(record.kind, &record.hashlock, &funder)?;

        let id = self.relayer.broadcast(tx).await?;
        self.escrow
            .mark_locked(record.kind, &record.hashlock, &funder, id.clone())?;
        self.track(id.clone(), record, funder);
        Ok(id)
    }

    /// Lock `record` with a transaction `funder` broadcast elsewhere and
    /// watch it until confirmation.
    ///
    /// Returns `false` when the transaction is already being watched.
    ///
    /// # Errors
    ///
    /// `Escrow` when the ledger refuses the lock. Nothing is watched then.
    pub fn track_funding(
        &self,
        id: TxId,
        record: RecordRef,
        funder: Address,
    ) -> Result<bool, EscrowError> {
        self.escrow
            .mark_locked(record.kind, &record.hashlock, &funder, id.clone())?;
        if self.tracked.lock().contains_key(&id) {
            return Ok(false);
        }
        self.track(id, record, funder);
        Ok(true)
    }

    fn track(&self, id: TxId, record: RecordRef, funder: Address) {
        let poller = self.relayer.watch(id.clone(), self.updates.clone());
        log_tx_event!(info, "funding_watcher", "Tracking funding transaction", id, record = %record, funder = %funder);
        self.tracked.lock().insert(
            id,
            Tracked {
                record,
                funder,
                _poller: poller,
            },
        );
    }

    /// Number of transactions being watched.
    pub fn tracked(&self) -> usize {
        self.tracked.lock().len()
    }

    /// Start the processing loop. Stops when `shutdown` flips to true.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` on a second call.
    pub fn spawn(
        self: &Arc<Self>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, WatcherError> {
        let receiver = self
            .receiver
            .lock()
            .take()
            .ok_or(WatcherError::AlreadyRunning)?;
        let ledgers = self
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Escrow, EventTopic::Order]));
        Ok(tokio::spawn(Arc::clone(self).run(receiver, ledgers, shutdown)))
    }

    async fn run(
        self: Arc<Self>,
        mut updates: mpsc::Receiver<ConfirmationUpdate>,
        mut ledgers: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let stopped = self.tracked.lock().drain().count();
                        info!(pollers = stopped, "Funding watcher stopping");
                        return;
                    }
                }
                Some(update) = updates.recv() => self.apply(update),
                Some(event) = ledgers.recv() => self.on_ledger_event(&event),
            }
        }
    }

    fn apply(&self, update: ConfirmationUpdate) {
        self.bus.publish(SwapEvent::TransactionObserved {
            chain: update.chain,
            transaction: update.id.clone(),
            confirmations: update.confirmations,
            confirmed: update.status == TxStatus::Confirmed,
            record: update.record.map(|r| (r.kind, r.hashlock)),
        });

        let tracked = {
            let tracked = self.tracked.lock();
            match tracked.get(&update.id) {
                Some(t) => (t.record, t.funder.clone()),
                None => {
                    debug!(tx_id = %update.id, "Update for untracked transaction");
                    return;
                }
            }
        };
        let (record, funder) = tracked;

        match update.status {
            TxStatus::Pending => {}
            TxStatus::Broadcast => {
                if let Err(e) =
                    self.escrow
                        .mark_locked(record.kind, &record.hashlock, &funder, update.id.clone())
                {
                    self.ledger_refused("mark_locked", &update.id, &record, e);
                }
            }
            TxStatus::Confirmed => {
                self.tracked.lock().remove(&update.id);
                match self.escrow.fund(
                    record.kind,
                    &record.hashlock,
                    &funder,
                    Some(update.id.clone()),
                ) {
                    Ok(_) => log_tx_event!(
                        info,
                        "funding_watcher",
                        "Record funded from confirmed transaction",
                        update.id,
                        record = %record,
                        confirmations = update.confirmations
                    ),
                    Err(e) => self.ledger_refused("fund", &update.id, &record, e),
                }
            }
            TxStatus::Failed => {
                self.tracked.lock().remove(&update.id);
                log_tx_event!(
                    warn,
                    "funding_watcher",
                    "Funding transaction failed or dropped",
                    update.id,
                    record = %record
                );
            }
        }
    }

    fn ledger_refused(&self, operation: &str, id: &TxId, record: &RecordRef, error: EscrowError) {
        if error.is_state_conflict() {
            // Someone else moved the record first.
            debug!(tx_id = %id, record = %record, operation, error = %error, "Ledger transition skipped");
            return;
        }
        warn!(tx_id = %id, record = %record, operation, error = %error, "Ledger refused funding transition");
        self.bus.publish(SwapEvent::CriticalError {
            source: "funding_watcher".to_string(),
            error: format!("{operation} {record} via {id}: {error}"),
        });
    }

    fn on_ledger_event(&self, event: &SwapEvent) {
        let SwapEvent::StatusChanged(transition) = event else {
            return;
        };
        if !transition.current.is_terminal() {
            return;
        }
        let record = RecordRef::new(transition.kind, transition.hashlock);
        let mut tracked = self.tracked.lock();
        let before = tracked.len();
        tracked.retain(|_, t| t.record != record);
        let cancelled = before - tracked.len();
        if cancelled > 0 {
            debug!(
                kind = %transition.kind,
                hashlock = %short_hex(&transition.hashlock),
                status = %transition.current,
                cancelled,
                "Record finalized, polling cancelled"
            );
        }
    }
}
