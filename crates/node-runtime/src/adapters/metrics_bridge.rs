//! # Metrics Bridge
//!
//! Subscribes to the notifier bus and turns events into Prometheus counters.
//! The ledgers stay free of metrics; everything they publish is counted here.

use shared_bus::{EventFilter, InMemoryEventBus, Subscription, SwapEvent};
use std::sync::Arc;
use swap_telemetry::metrics::{LEDGER_TRANSITIONS, NOTIFIER_EVENTS};
use swap_telemetry::metric_inc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Label for an event's topic.
pub fn topic_label(event: &SwapEvent) -> &'static str {
    match event {
        SwapEvent::StatusChanged(t) => t.kind.as_str(),
        SwapEvent::TransactionObserved { .. } => "relayer",
        SwapEvent::CriticalError { .. } => "dlq",
    }
}

/// Record one event.
pub fn record(event: &SwapEvent) {
    metric_inc!(NOTIFIER_EVENTS, &[topic_label(event)]);
    match event {
        SwapEvent::StatusChanged(t) => {
            metric_inc!(LEDGER_TRANSITIONS, &[t.kind.as_str(), t.current.as_str()]);
        }
        SwapEvent::CriticalError { source, error } => {
            error!(source = %source, error = %error, "Critical error published");
        }
        SwapEvent::TransactionObserved { .. } => {}
    }
}

/// Spawn the bridge. It stops when `shutdown` flips to true or the bus is
/// dropped.
pub fn spawn(bus: &Arc<InMemoryEventBus>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let subscription = bus.subscribe(EventFilter::all());
    tokio::spawn(run(subscription, shutdown))
}

async fn run(mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Metrics bridge stopping");
                    return;
                }
            }
            event = subscription.recv() => match event {
                Some(event) => record(&event),
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventPublisher, StatusTransition};
    use shared_types::{EscrowStatus, LedgerKind};
    use std::time::Duration;

    fn transition(current: EscrowStatus) -> SwapEvent {
        SwapEvent::StatusChanged(StatusTransition {
            kind: LedgerKind::Order,
            hashlock: [3; 32],
            previous: None,
            current,
            timestamp: 1,
            transaction_reference: None,
        })
    }

    #[test]
    fn test_topic_labels() {
        assert_eq!(topic_label(&transition(EscrowStatus::Created)), "order");
        assert_eq!(
            topic_label(&SwapEvent::CriticalError {
                source: "watcher".into(),
                error: "boom".into()
            }),
            "dlq"
        );
    }

    #[tokio::test]
    async fn test_bridge_counts_transitions() {
        let bus = Arc::new(InMemoryEventBus::new());
        let (stop, stopped) = watch::channel(false);
        let task = spawn(&bus, stopped);

        let counter = LEDGER_TRANSITIONS.with_label_values(&["order", "claimed"]);
        let before = counter.get();
        bus.publish(transition(EscrowStatus::Claimed));

        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.get() <= before {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("transition not counted");

        stop.send(true).unwrap();
        task.await.unwrap();
    }
}
