//! # Refund Sweeper
//!
//! Periodically refunds every expired record in both ledgers and prunes the
//! relayer's mempool view.

use shared_types::{short_hex, LedgerKind};
use std::sync::Arc;
use std::time::Duration;
use sw_01_escrow::{EscrowApi, EscrowService, SweepReport};
use sw_02_chain_relayer::ChainRelayer;
use swap_telemetry::metrics::REFUND_SWEEP_REFUNDED;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Totals of one pass over both ledgers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    /// Records refunded.
    pub refunded: usize,
    /// Records finalized concurrently by someone else.
    pub lost_races: usize,
    /// Records that failed to refund.
    pub failed: usize,
    /// Mempool entries pruned.
    pub pruned: usize,
}

impl SweepSummary {
    fn absorb(&mut self, report: &SweepReport) {
        self.refunded += report.refunded.len();
        self.lost_races += report.lost_races;
        self.failed += report.failed.len();
        for (hashlock, error) in &report.failed {
            warn!(
                kind = %report.kind,
                hashlock = %short_hex(hashlock),
                error = %error,
                "Expired record could not be refunded"
            );
        }
    }
}

/// Periodic expiry sweep.
pub struct RefundSweeper {
    escrow: Arc<EscrowService>,
    relayer: Option<ChainRelayer>,
    interval: Duration,
}

impl RefundSweeper {
    /// Create a sweeper. `relayer` is pruned on every pass when present.
    pub fn new(escrow: Arc<EscrowService>, relayer: Option<ChainRelayer>, interval: Duration) -> Self {
        Self {
            escrow,
            relayer,
            interval,
        }
    }

    /// Run one pass now.
    pub fn sweep_once(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for kind in [LedgerKind::Escrow, LedgerKind::Order] {
            let report = self.escrow.refund_expired(kind);
            summary.absorb(&report);
        }
        REFUND_SWEEP_REFUNDED.inc_by(summary.refunded as f64);

        if let Some(relayer) = &self.relayer {
            summary.pruned = relayer.prune().len();
        }

        if summary.refunded > 0 || summary.failed > 0 {
            info!(
                refunded = summary.refunded,
                lost_races = summary.lost_races,
                failed = summary.failed,
                pruned = summary.pruned,
                "Refund sweep finished"
            );
        } else {
            debug!(pruned = summary.pruned, "Refund sweep found nothing to do");
        }
        summary
    }

    /// Sweep every `interval` until `shutdown` flips to true.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = self.interval.as_secs(), "Refund sweeper started");
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("Refund sweeper stopping");
                            return;
                        }
                    }
                    _ = ticker.tick() => {
                        self.sweep_once();
                    }
                }
            }
        })
    }
}
