//! # Relayer Funding Flow
//!
//! The node as `main` builds it, with a scripted chain backend:
//!
//! ```text
//! Lock request → FundingWatcher.submit_funding → backend confirms
//!      → watcher funds the record → Claim request settles it
//! ```

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use node_runtime::{NodeConfig, NodeRuntime, SwapContainer};
    use serde_json::json;
    use shared_bus::{EventFilter, EventTopic, SwapEvent};
    use shared_types::{hash_to_hex, ChainId, EscrowStatus, LedgerKind, ManualTimeSource, TimeSource};
    use std::sync::Arc;
    use std::time::Duration;
    use sw_01_escrow::{generate_pair, EscrowApi};
    use sw_02_chain_relayer::{
        ChainBackend, MockChainBackend, OutgoingTransaction, RecordRef, RetryPolicy,
    };

    struct Node {
        runtime: NodeRuntime,
        backend: Arc<MockChainBackend>,
        clock: Arc<ManualTimeSource>,
    }

    fn node() -> Node {
        let mut config = NodeConfig::default();
        config.escrow.admin = Some(addr(ADMIN));
        config.coordinator.sender_keys = sender_keys();
        config.escrow.refund_sweep_enabled = false;
        config.relayer.chain = ChainId::BITCOIN;
        config.relayer.min_confirmations = 2;
        config.relayer.poll_interval = Duration::from_millis(10);
        config.relayer.retry = RetryPolicy::no_retry();

        let clock = Arc::new(ManualTimeSource::new(NOW));
        let backend = Arc::new(MockChainBackend::new(ChainId::BITCOIN));
        let container = SwapContainer::with_parts(
            config,
            clock.clone(),
            Some(backend.clone() as Arc<dyn ChainBackend>),
        )
        .unwrap();
        Node {
            runtime: NodeRuntime::new(container),
            backend,
            clock,
        }
    }

    impl Node {
        fn send(&self, sender: &str, message: serde_json::Value) -> serde_json::Value {
            let line = request_line(sender, self.clock.now(), message);
            let response = self.runtime.container().coordinator.handle_json(&line);
            assert!(response.ok, "{response:?}");
            response.result.unwrap()
        }
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn test_confirmed_funding_then_claim() {
        let node = node();
        node.runtime.start().unwrap();
        let container = node.runtime.container().clone();
        let watcher = container.funding_watcher.clone().unwrap();

        let (secret, hashlock) = generate_pair();
        let hash = hash_to_hex(&hashlock);
        let mut stream = container
            .event_bus
            .subscribe(EventFilter::record(LedgerKind::Escrow, hashlock));

        node.send(
            MAKER,
            json!({
                "op": "Lock",
                "payload": {
                    "hash": hash,
                    "sourceChainId": -1000,
                    "destChainId": -3,
                    "asset": "BTC",
                    "receiver": "EQreceiver",
                    "timelock": NOW + 3_600,
                    "amount": AMOUNT as u64,
                }
            }),
        );
        node.send(
            ADMIN,
            json!({
                "op": "SetWhiteList",
                "payload": { "resolver": RESOLVER, "whitelistStatus": true }
            }),
        );

        let raw = vec![0xbe, 0xef];
        let tx = OutgoingTransaction::new(raw.clone(), 250)
            .for_record(RecordRef::new(LedgerKind::Escrow, hashlock));
        let id = watcher.submit_funding(tx, addr(RESOLVER)).await.unwrap();
        assert_eq!(id, MockChainBackend::id_for(&raw));

        let status = || container.escrow.get(LedgerKind::Escrow, &hashlock).map(|r| r.status);
        assert_eq!(status(), Some(EscrowStatus::Locked));

        // One block deep is not enough.
        node.backend.set_tip(500);
        node.backend.confirm(&id, 500);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(status(), Some(EscrowStatus::Locked));

        node.backend.mine(1);
        eventually(|| status() == Some(EscrowStatus::Funded)).await;
        let record = container.escrow.get(LedgerKind::Escrow, &hashlock).unwrap();
        assert_eq!(record.funder, Some(addr(RESOLVER)));
        assert_eq!(record.funding_tx, Some(id.clone()));
        assert_eq!(watcher.tracked(), 0);

        let settled = node.send(
            "EQanyone",
            json!({
                "op": "Claim",
                "payload": { "kind": "escrow", "hash": hash, "secret": secret.to_hex() }
            }),
        );
        assert_eq!(settled["recipient"], RESOLVER);
        assert_eq!(settled["amount"], AMOUNT.to_string());

        let mut seen = Vec::new();
        while seen.len() < 4 {
            let event = tokio::time::timeout(Duration::from_secs(5), stream.recv())
                .await
                .unwrap()
                .unwrap();
            if let SwapEvent::StatusChanged(transition) = event {
                seen.push(transition.current);
            }
        }
        assert_eq!(
            seen,
            vec![
                EscrowStatus::Created,
                EscrowStatus::Locked,
                EscrowStatus::Funded,
                EscrowStatus::Claimed,
            ]
        );

        // The mempool view still correlates the funding transaction.
        let relayer = container.relayer.as_ref().unwrap();
        let correlated = relayer.correlate(&RecordRef::new(LedgerKind::Escrow, hashlock));
        assert_eq!(correlated.len(), 1);
        assert_eq!(correlated[0].id, id);

        node.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_relayer_observations_reach_bus() {
        let node = node();
        node.runtime.start().unwrap();
        let container = node.runtime.container().clone();
        let watcher = container.funding_watcher.clone().unwrap();
        let mut relayer_events = container
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Relayer]));

        let (_, hashlock) = generate_pair();
        node.send(
            ADMIN,
            json!({
                "op": "SetWhiteList",
                "payload": { "resolver": RESOLVER, "whitelistStatus": true }
            }),
        );
        node.send(
            MAKER,
            json!({
                "op": "Create",
                "payload": {
                    "hash": hash_to_hex(&hashlock),
                    "chainId": -1000,
                    "asset": "BTC",
                    "timelock": NOW + 600,
                    "amount": "42",
                }
            }),
        );

        let tx = OutgoingTransaction::new(vec![0x01], 1)
            .for_record(RecordRef::new(LedgerKind::Order, hashlock));
        let id = watcher.submit_funding(tx, addr(RESOLVER)).await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), relayer_events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            SwapEvent::TransactionObserved {
                transaction,
                confirmed,
                record,
                ..
            } => {
                assert_eq!(transaction, id);
                assert!(!confirmed);
                assert_eq!(record, Some((LedgerKind::Order, hashlock)));
            }
            other => panic!("unexpected event {other:?}"),
        }

        // Expiry refund stops the watcher from funding later.
        node.clock.advance(600);
        node.send(
            MAKER,
            json!({ "op": "RefundOrder", "payload": { "hash": hash_to_hex(&hashlock) } }),
        );
        eventually(|| watcher.tracked() == 0).await;
        assert_eq!(
            container.escrow.get(LedgerKind::Order, &hashlock).unwrap().status,
            EscrowStatus::Refunded
        );

        node.runtime.shutdown().await;
    }
}
