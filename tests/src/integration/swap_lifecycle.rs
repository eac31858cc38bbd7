//! # Swap Lifecycle
//!
//! Create → fund → claim, expiry refunds, whitelist changes and the
//! claim/refund race, driven through `EscrowApi`.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use node_runtime::handlers::RefundSweeper;
    use shared_types::{EscrowStatus, LedgerKind};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;
    use sw_01_escrow::{EscrowApi, EscrowError, SettlementAction};

    #[test]
    fn test_escrow_claim_pays_resolver() {
        let h = SwapHarness::new();
        let (secret, hashlock) = h.open_escrow(NOW + 3_600);

        let funded = h
            .escrow
            .fund(LedgerKind::Escrow, &hashlock, &addr(RESOLVER), None)
            .unwrap();
        assert_eq!(funded.status, EscrowStatus::Funded);

        h.clock.advance(60);
        let settlement = h.escrow.claim(LedgerKind::Escrow, &hashlock, &secret).unwrap();
        assert_eq!(settlement.action, SettlementAction::Claim);
        assert_eq!(settlement.recipient, addr(RESOLVER));
        assert_eq!(settlement.amount, AMOUNT);
        assert_eq!(settlement.settled_at, NOW + 60);

        let record = h.escrow.get(LedgerKind::Escrow, &hashlock).unwrap();
        assert_eq!(record.status, EscrowStatus::Claimed);
        assert_eq!(record.revealed_secret, Some(secret.expose()));

        // Terminal: neither a second claim nor a late refund moves it.
        assert!(matches!(
            h.escrow.claim(LedgerKind::Escrow, &hashlock, &secret),
            Err(EscrowError::AlreadyFinalized(EscrowStatus::Claimed))
        ));
        h.clock.advance(3_600);
        assert!(matches!(
            h.escrow.refund("escrow", &hashlock),
            Err(EscrowError::AlreadyFinalized(EscrowStatus::Claimed))
        ));
    }

    #[test]
    fn test_refund_one_second_after_creation() {
        let h = SwapHarness::new();
        let (secret, hashlock) = h.open_escrow(NOW + 1);

        assert!(matches!(
            h.escrow.refund("escrow", &hashlock),
            Err(EscrowError::TimelockNotExpired { timelock, now }) if timelock == NOW + 1 && now == NOW
        ));

        h.clock.advance(1);
        let settlement = h.escrow.refund("escrow", &hashlock).unwrap();
        assert_eq!(settlement.action, SettlementAction::Refund);
        assert_eq!(settlement.recipient, addr(MAKER));

        assert!(matches!(
            h.escrow.claim(LedgerKind::Escrow, &hashlock, &secret),
            Err(EscrowError::AlreadyFinalized(EscrowStatus::Refunded))
        ));
    }

    #[test]
    fn test_refund_kind_selects_ledger() {
        let h = SwapHarness::new();
        let (_, hashlock) = h.open_order(NOW + 10);
        h.clock.advance(10);

        assert!(matches!(
            h.escrow.refund("escrow", &hashlock),
            Err(EscrowError::NotFound(_))
        ));
        assert!(matches!(
            h.escrow.refund("vault", &hashlock),
            Err(EscrowError::InvalidRefundKind(ref k)) if k == "vault"
        ));
        assert_eq!(
            h.escrow.get(LedgerKind::Order, &hashlock).unwrap().status,
            EscrowStatus::Created
        );
        h.escrow.refund("order", &hashlock).unwrap();
    }

    #[test]
    fn test_funded_order_refunds_to_funder() {
        let h = SwapHarness::new();
        let (_, hashlock) = h.open_order(NOW + 100);
        h.escrow
            .fund(LedgerKind::Order, &hashlock, &addr(RESOLVER), None)
            .unwrap();

        h.clock.set(NOW + 100);
        let settlement = h.escrow.refund("order", &hashlock).unwrap();
        assert_eq!(settlement.recipient, addr(RESOLVER));
    }

    #[test]
    fn test_whitelist_toggle_gates_funding() {
        let h = SwapHarness::new();
        let (_, hashlock) = h.open_escrow(NOW + 3_600);

        assert!(h
            .escrow
            .set_whitelist(&addr(ADMIN), addr(RESOLVER), false)
            .unwrap());
        assert!(matches!(
            h.escrow.fund(LedgerKind::Escrow, &hashlock, &addr(RESOLVER), None),
            Err(EscrowError::ResolverNotWhitelisted(_))
        ));
        assert_eq!(
            h.escrow.get(LedgerKind::Escrow, &hashlock).unwrap().status,
            EscrowStatus::Created
        );

        // Only the admin may flip it back.
        assert!(matches!(
            h.escrow.set_whitelist(&addr(RESOLVER), addr(RESOLVER), true),
            Err(EscrowError::Unauthorized(_))
        ));
        assert!(h
            .escrow
            .set_whitelist(&addr(ADMIN), addr(RESOLVER), true)
            .unwrap());
        assert!(!h
            .escrow
            .set_whitelist(&addr(ADMIN), addr(RESOLVER), true)
            .unwrap());

        h.escrow
            .fund(LedgerKind::Escrow, &hashlock, &addr(RESOLVER), None)
            .unwrap();
        assert!(h.escrow.is_whitelisted(&addr(RESOLVER)));
    }

    #[test]
    fn test_claim_refund_race_has_one_winner() {
        for _ in 0..32 {
            let h = SwapHarness::new();
            let (secret, hashlock) = h.open_escrow(NOW + 5);
            h.escrow
                .fund(LedgerKind::Escrow, &hashlock, &addr(RESOLVER), None)
                .unwrap();
            h.clock.advance(5);

            let barrier = Arc::new(Barrier::new(2));
            let claimer = {
                let escrow = h.escrow.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    escrow.claim(LedgerKind::Escrow, &hashlock, &secret)
                })
            };
            let refunder = {
                let escrow = h.escrow.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    escrow.refund("escrow", &hashlock)
                })
            };

            let results = [claimer.join().unwrap(), refunder.join().unwrap()];
            let winners = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(winners, 1, "{results:?}");
            let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
            assert!(matches!(loser, EscrowError::AlreadyFinalized(_)), "{loser:?}");

            let status = h.escrow.get(LedgerKind::Escrow, &hashlock).unwrap().status;
            assert!(status.is_terminal());
        }
    }

    #[test]
    fn test_sweeper_refunds_only_expired_records() {
        let h = SwapHarness::new();
        let (_, expiring) = h.open_escrow(NOW + 10);
        let (_, expiring_order) = h.open_order(NOW + 10);
        let (_, open) = h.open_escrow(NOW + 3_600);

        let sweeper = RefundSweeper::new(h.escrow.clone(), None, Duration::from_secs(60));
        assert_eq!(sweeper.sweep_once().refunded, 0);

        h.clock.advance(10);
        let summary = sweeper.sweep_once();
        assert_eq!(summary.refunded, 2);
        assert_eq!(summary.failed, 0);

        assert_eq!(
            h.escrow.get(LedgerKind::Escrow, &expiring).unwrap().status,
            EscrowStatus::Refunded
        );
        assert_eq!(
            h.escrow.get(LedgerKind::Order, &expiring_order).unwrap().status,
            EscrowStatus::Refunded
        );
        assert_eq!(
            h.escrow.get(LedgerKind::Escrow, &open).unwrap().status,
            EscrowStatus::Created
        );
    }
}
