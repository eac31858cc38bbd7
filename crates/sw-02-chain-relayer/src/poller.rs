//! # Confirmation Polling
//!
//! One task per watched transaction. The task polls on a fixed interval,
//! sends an update whenever the status or depth changes, and exits on
//! `Confirmed`, `Failed`, cancellation, or when the receiver is gone.
//! Polling errors are logged and retried on the next tick.

use crate::domain::{ConfirmationUpdate, TxId};
use crate::service::{ChainRelayer, Observation};
use swap_telemetry::metrics::RELAYER_POLL_ERRORS;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Handle to a polling task. Dropping it cancels the task.
#[derive(Debug)]
pub struct PollHandle {
    id: TxId,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Transaction being watched.
    pub fn id(&self) -> &TxId {
        &self.id
    }

    /// Ask the task to stop. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit.
    pub async fn join(mut self) {
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                warn!(tx_id = %self.id, error = %e, "Poll task panicked");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub(crate) fn spawn(
    relayer: ChainRelayer,
    id: TxId,
    updates: mpsc::Sender<ConfirmationUpdate>,
) -> PollHandle {
    let (cancel, cancelled) = watch::channel(false);
    let task = tokio::spawn(poll_loop(relayer, id.clone(), updates, cancelled));
    PollHandle { id, cancel, task }
}

async fn poll_loop(
    relayer: ChainRelayer,
    id: TxId,
    updates: mpsc::Sender<ConfirmationUpdate>,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(relayer.config().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<Observation> = None;

    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                // A closed channel means the handle is gone.
                if changed.is_err() || *cancelled.borrow() {
                    debug!(tx_id = %id, "Poll task cancelled");
                    return;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let observation = match relayer.observe(&id).await {
            Ok(observation) => observation,
            Err(error) => {
                RELAYER_POLL_ERRORS.inc();
                warn!(tx_id = %id, error = %error, "Status poll failed, will retry");
                continue;
            }
        };

        if last != Some(observation) {
            last = Some(observation);
            let update = ConfirmationUpdate {
                id: id.clone(),
                chain: relayer.chain(),
                status: observation.status,
                confirmations: observation.confirmations,
                record: relayer.mempool().get(&id).and_then(|tx| tx.record),
            };
            if updates.send(update).await.is_err() {
                debug!(tx_id = %id, "Update receiver dropped, stopping poll task");
                return;
            }
        }

        if observation.status.is_terminal() {
            info!(tx_id = %id, status = %observation.status, "Poll task finished");
            return;
        }
    }
}
