//! # Notifier Ordering
//!
//! Ledger transitions published from many threads still arrive in order on
//! each record's stream, and convert to the external `order_update` shape.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use shared_bus::{EventFilter, EventPublisher, EventTopic, StatusMessage, SwapEvent};
    use shared_types::{hash_to_hex, EscrowStatus, Hash, LedgerKind};
    use std::thread;
    use sw_01_escrow::EscrowApi;

    fn drain(subscription: &mut shared_bus::Subscription) -> Vec<SwapEvent> {
        let mut events = Vec::new();
        while let Some(event) = subscription.try_recv().unwrap() {
            events.push(event);
        }
        events
    }

    fn statuses(events: &[SwapEvent]) -> Vec<(Option<EscrowStatus>, EscrowStatus)> {
        events
            .iter()
            .filter_map(|e| match e {
                SwapEvent::StatusChanged(t) => Some((t.previous, t.current)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_per_record_streams_stay_ordered_across_threads() {
        let h = SwapHarness::new();
        let records: Vec<_> = (0..8).map(|_| h.open_order(NOW + 3_600)).collect();
        let mut streams: Vec<(Hash, _)> = records
            .iter()
            .map(|(_, hashlock)| {
                (
                    *hashlock,
                    h.bus.subscribe(EventFilter::record(LedgerKind::Order, *hashlock)),
                )
            })
            .collect();

        let workers: Vec<_> = records
            .into_iter()
            .map(|(secret, hashlock)| {
                let escrow = h.escrow.clone();
                thread::spawn(move || {
                    escrow
                        .fund(LedgerKind::Order, &hashlock, &addr(RESOLVER), None)
                        .unwrap();
                    escrow.claim(LedgerKind::Order, &hashlock, &secret).unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        for (hashlock, stream) in &mut streams {
            let events = drain(stream);
            assert!(events
                .iter()
                .all(|e| e.record() == Some((LedgerKind::Order, *hashlock))));
            assert_eq!(
                statuses(&events),
                vec![
                    (Some(EscrowStatus::Created), EscrowStatus::Funded),
                    (Some(EscrowStatus::Funded), EscrowStatus::Claimed),
                ]
            );
        }
    }

    #[test]
    fn test_topic_subscriber_sees_creation_first() {
        let h = SwapHarness::new();
        let mut escrow_topic = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Escrow]));
        let mut order_topic = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Order]));

        let (_, escrow_hash) = h.open_escrow(NOW + 10);
        h.clock.advance(10);
        h.escrow.refund("escrow", &escrow_hash).unwrap();

        assert_eq!(
            statuses(&drain(&mut escrow_topic)),
            vec![
                (None, EscrowStatus::Created),
                (Some(EscrowStatus::Created), EscrowStatus::Refunded),
            ]
        );
        assert!(drain(&mut order_topic).is_empty());
    }

    #[test]
    fn test_rejected_operations_publish_nothing() {
        let h = SwapHarness::new();
        let (_, hashlock) = h.open_escrow(NOW + 3_600);
        let published = h.bus.events_published();
        let mut stream = h.bus.subscribe(EventFilter::all());

        assert!(h.escrow.refund("escrow", &hashlock).is_err());
        assert!(h
            .escrow
            .fund(LedgerKind::Escrow, &hashlock, &addr("0xunknown"), None)
            .is_err());

        assert_eq!(h.bus.events_published(), published);
        assert!(drain(&mut stream).is_empty());
    }

    #[test]
    fn test_transition_converts_to_order_update() {
        let h = SwapHarness::new();
        let mut stream = h.bus.subscribe(EventFilter::record(LedgerKind::Order, [0; 32]));
        let (_, hashlock) = h.open_order(NOW + 3_600);
        let mut stream_for_record = h.bus.subscribe(EventFilter::record(LedgerKind::Order, hashlock));

        h.escrow
            .fund(LedgerKind::Order, &hashlock, &addr(RESOLVER), None)
            .unwrap();

        let event = drain(&mut stream_for_record).remove(0);
        let message = StatusMessage::from_event(&event, NOW).unwrap();
        let wire: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(wire["type"], "order_update");
        assert_eq!(wire["data"]["orderId"], hash_to_hex(&hashlock));
        assert_eq!(wire["data"]["status"], "funded");
        assert_eq!(wire["timestamp"], NOW);

        // Another record's stream saw none of it.
        assert!(drain(&mut stream).is_empty());
    }
}
