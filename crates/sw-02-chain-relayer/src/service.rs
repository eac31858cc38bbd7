//! # Chain Relayer Service
//!
//! Broadcasts transactions through a `ChainBackend`, tracks them in the
//! mempool view and reports their depth.

use crate::domain::{
    BackendError, ChainTransaction, ConfirmationUpdate, MempoolView, OutgoingTransaction,
    RecordRef, RelayerConfig, RelayerError, TxId, TxStatus,
};
use crate::poller::{self, PollHandle};
use crate::ports::ChainBackend;
use shared_types::{ChainId, TimeSource};
use std::sync::Arc;
use swap_telemetry::metrics::{
    RELAYER_BROADCAST_ATTEMPTS, RELAYER_BROADCAST_DURATION, RELAYER_MEMPOOL_SIZE,
};
use swap_telemetry::{log_tx_event, metric_inc, time_histogram};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of one status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Derived status.
    pub status: TxStatus,
    /// Depth at poll time.
    pub confirmations: u64,
}

/// Relayer for one chain. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ChainRelayer {
    backend: Arc<dyn ChainBackend>,
    mempool: Arc<MempoolView>,
    config: RelayerConfig,
    clock: Arc<dyn TimeSource>,
}

impl ChainRelayer {
    /// Create a relayer over `backend`.
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        config: RelayerConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let mempool = Arc::new(MempoolView::new(config.retention_secs));
        Self {
            backend,
            mempool,
            config,
            clock,
        }
    }

    /// Chain served by the backend.
    pub fn chain(&self) -> ChainId {
        self.backend.chain()
    }

    /// Active configuration.
    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    /// Local view of broadcast transactions.
    pub fn mempool(&self) -> &MempoolView {
        &self.mempool
    }

    /// Submit a transaction, retrying transient failures with backoff.
    ///
    /// On success the transaction is tracked in the mempool view with status
    /// `Broadcast`.
    ///
    /// # Errors
    ///
    /// `BroadcastFailed` on a permanent backend error or once
    /// `retry.max_attempts` submissions have failed.
    pub async fn broadcast(&self, tx: OutgoingTransaction) -> Result<TxId, RelayerError> {
        let _timer = time_histogram!(RELAYER_BROADCAST_DURATION);
        let policy = &self.config.retry;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.backend.submit(&tx.raw).await {
                Ok(id) => {
                    metric_inc!(RELAYER_BROADCAST_ATTEMPTS, &["ok"]);
                    log_tx_event!(
                        info,
                        "relayer",
                        "Transaction broadcast",
                        id,
                        chain = %self.chain(),
                        attempts = attempts
                    );
                    let tracked = ChainTransaction::broadcast(
                        id.clone(),
                        self.chain(),
                        tx,
                        self.clock.now(),
                    );
                    self.mempool.insert(tracked);
                    RELAYER_MEMPOOL_SIZE.set(self.mempool.len() as f64);
                    return Ok(id);
                }
                Err(error) if error.is_transient() && policy.should_retry(attempts) => {
                    metric_inc!(RELAYER_BROADCAST_ATTEMPTS, &["transient"]);
                    let backoff = policy.backoff_for_attempt(attempts - 1);
                    warn!(
                        attempt = attempts,
                        max_attempts = policy.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Broadcast failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => {
                    let outcome = if error.is_transient() {
                        "transient"
                    } else {
                        "permanent"
                    };
                    metric_inc!(RELAYER_BROADCAST_ATTEMPTS, &[outcome]);
                    warn!(attempts = attempts, error = %error, "Broadcast failed");
                    return Err(RelayerError::BroadcastFailed {
                        attempts,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }

    /// Current status of `id`. `Confirmed` once the depth reaches
    /// `min_confirmations`.
    pub async fn get_status(&self, id: &TxId) -> Result<TxStatus, RelayerError> {
        self.observe(id).await.map(|o| o.status)
    }

    /// Poll the backend once and update the mempool view.
    ///
    /// A transaction the node no longer knows is reported as `Failed`.
    pub async fn observe(&self, id: &TxId) -> Result<Observation, RelayerError> {
        let status_error = |source: BackendError| RelayerError::Status {
            id: id.clone(),
            source,
        };

        let observation = match self.backend.tx_status(id).await {
            Ok(status) if status.confirmed => {
                let tip = self.backend.tip_height().await.map_err(status_error)?;
                let confirmations = status.confirmations(tip);
                let status = if confirmations >= self.config.min_confirmations {
                    TxStatus::Confirmed
                } else {
                    TxStatus::Broadcast
                };
                Observation {
                    status,
                    confirmations,
                }
            }
            Ok(_) => Observation {
                status: TxStatus::Broadcast,
                confirmations: 0,
            },
            Err(BackendError::NotFound) => Observation {
                status: TxStatus::Failed,
                confirmations: 0,
            },
            Err(error) => return Err(status_error(error)),
        };

        self.mempool.record_poll(
            id,
            observation.status,
            observation.confirmations,
            self.clock.now(),
        );
        debug!(
            tx_id = %id,
            status = %observation.status,
            confirmations = observation.confirmations,
            "Polled transaction status"
        );
        Ok(observation)
    }

    /// Tracked transactions attached to a record.
    pub fn correlate(&self, record: &RecordRef) -> Vec<ChainTransaction> {
        self.mempool.correlate(record)
    }

    /// Drop mempool entries older than the retention window.
    pub fn prune(&self) -> Vec<TxId> {
        let pruned = self.mempool.prune(self.clock.now());
        RELAYER_MEMPOOL_SIZE.set(self.mempool.len() as f64);
        pruned
    }

    /// Poll `id` every `poll_interval` until it is Confirmed or Failed,
    /// sending each change to `updates`.
    ///
    /// Dropping or cancelling the handle stops the task.
    pub fn watch(&self, id: TxId, updates: mpsc::Sender<ConfirmationUpdate>) -> PollHandle {
        info!(
            tx_id = %id,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Watching transaction"
        );
        poller::spawn(self.clone(), id, updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockChainBackend;
    use crate::algorithms::RetryPolicy;
    use shared_types::{LedgerKind, ManualTimeSource};
    use std::time::Duration;

    fn fast_config(min_confirmations: u64, max_attempts: u32) -> RelayerConfig {
        RelayerConfig {
            chain: ChainId::BITCOIN,
            min_confirmations,
            poll_interval: Duration::from_millis(10),
            retention_secs: 3_600,
            retry: RetryPolicy {
                max_attempts,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
                backoff_multiplier: 2.0,
            },
        }
    }

    fn relayer(config: RelayerConfig) -> (ChainRelayer, Arc<MockChainBackend>) {
        let backend = Arc::new(MockChainBackend::new(ChainId::BITCOIN));
        let clock = Arc::new(ManualTimeSource::new(1_000));
        (ChainRelayer::new(backend.clone(), config, clock), backend)
    }

    #[tokio::test]
    async fn test_broadcast_tracks_transaction() {
        let (relayer, _) = relayer(fast_config(1, 3));
        let record = RecordRef::new(LedgerKind::Escrow, [5; 32]);
        let id = relayer
            .broadcast(OutgoingTransaction::new(vec![0xaa], 10).for_record(record))
            .await
            .unwrap();

        assert_eq!(id, MockChainBackend::id_for(&[0xaa]));
        let tracked = relayer.mempool().get(&id).unwrap();
        assert_eq!(tracked.status, TxStatus::Broadcast);
        assert_eq!(tracked.first_seen, 1_000);
        assert_eq!(relayer.correlate(&record).len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_retries_transient_errors() {
        let (relayer, backend) = relayer(fast_config(1, 3));
        backend.fail_next_submit(BackendError::Transient("timeout".into()));
        backend.fail_next_submit(BackendError::Transient("503".into()));

        let id = relayer
            .broadcast(OutgoingTransaction::new(vec![1], 10))
            .await
            .unwrap();
        assert_eq!(id, MockChainBackend::id_for(&[1]));
        assert_eq!(backend.submit_attempts(), 3);
    }

    #[tokio::test]
    async fn test_broadcast_gives_up_after_max_attempts() {
        let (relayer, backend) = relayer(fast_config(1, 2));
        for _ in 0..3 {
            backend.fail_next_submit(BackendError::Transient("connection reset".into()));
        }

        let err = relayer
            .broadcast(OutgoingTransaction::new(vec![1], 10))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::BroadcastFailed { attempts: 2, .. }));
        assert_eq!(backend.submit_attempts(), 2);
        assert!(relayer.mempool().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_permanent_error_not_retried() {
        let (relayer, backend) = relayer(fast_config(1, 5));
        backend.fail_next_submit(BackendError::Rejected("bad-txns".into()));

        let err = relayer
            .broadcast(OutgoingTransaction::new(vec![1], 10))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayerError::BroadcastFailed { attempts: 1, .. }));
        assert_eq!(backend.submit_attempts(), 1);
    }

    #[tokio::test]
    async fn test_status_requires_min_confirmations() {
        let (relayer, backend) = relayer(fast_config(3, 1));
        let id = relayer
            .broadcast(OutgoingTransaction::new(vec![2], 10))
            .await
            .unwrap();
        assert_eq!(relayer.get_status(&id).await.unwrap(), TxStatus::Broadcast);

        backend.set_tip(100);
        backend.confirm(&id, 100);
        let seen = relayer.observe(&id).await.unwrap();
        assert_eq!(seen.status, TxStatus::Broadcast);
        assert_eq!(seen.confirmations, 1);

        backend.mine(2);
        assert_eq!(relayer.get_status(&id).await.unwrap(), TxStatus::Confirmed);
        let tracked = relayer.mempool().get(&id).unwrap();
        assert_eq!(tracked.confirmations, 3);
        assert_eq!(tracked.last_polled, Some(1_000));
    }

    #[tokio::test]
    async fn test_dropped_transaction_is_failed() {
        let (relayer, backend) = relayer(fast_config(1, 1));
        let id = relayer
            .broadcast(OutgoingTransaction::new(vec![3], 10))
            .await
            .unwrap();
        backend.drop_tx(&id);
        assert_eq!(relayer.get_status(&id).await.unwrap(), TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_status_backend_error_surfaces() {
        let (relayer, backend) = relayer(fast_config(1, 1));
        backend.fail_next_status(BackendError::Transient("timeout".into()));
        let err = relayer.get_status(&TxId::new("ab")).await.unwrap_err();
        assert!(err.is_transient());
    }
}
