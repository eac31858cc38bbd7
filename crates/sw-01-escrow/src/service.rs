//! # Escrow Service
//!
//! Wires the registry, both ledgers and the refund manager behind the
//! `EscrowApi` port, reading time from an injected `TimeSource`.

use crate::domain::{
    CreateParams, EscrowError, EscrowLedger, OrderLedger, Resolver, ResolverRegistry,
    SecureSecret, Settlement, SwapLedger, SwapRecord,
};
use crate::ports::{EscrowApi, TimeSource};
use crate::refund::{RefundManager, SweepReport};
use shared_bus::EventPublisher;
use shared_types::{Address, Hash, LedgerKind, TxReference};
use std::sync::Arc;

/// The escrow subsystem.
pub struct EscrowService {
    registry: Arc<ResolverRegistry>,
    refunds: RefundManager,
    clock: Arc<dyn TimeSource>,
}

impl EscrowService {
    /// Build a service with empty ledgers.
    pub fn new(
        admin: Address,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let escrow = Arc::new(EscrowLedger::new(publisher.clone()));
        let order = Arc::new(OrderLedger::new(publisher));
        Self {
            registry: Arc::new(ResolverRegistry::new(admin)),
            refunds: RefundManager::new(escrow, order),
            clock,
        }
    }

    /// The ledger for `kind`.
    pub fn ledger(&self, kind: LedgerKind) -> &dyn SwapLedger {
        self.refunds.ledger(kind)
    }

    /// The resolver registry.
    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// The refund manager.
    pub fn refunds(&self) -> &RefundManager {
        &self.refunds
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }
}

impl EscrowApi for EscrowService {
    fn create(&self, kind: LedgerKind, params: CreateParams) -> Result<Hash, EscrowError> {
        self.ledger(kind)
            .create(params, self.clock.now(), &self.registry)
    }

    fn check_lock(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        funder: &Address,
    ) -> Result<(), EscrowError> {
        self.ledger(kind).check_lock(hashlock, funder, &self.registry)
    }

    fn mark_locked(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        funder: &Address,
        transaction: TxReference,
    ) -> Result<bool, EscrowError> {
        self.ledger(kind)
            .mark_locked(hashlock, funder, transaction, self.clock.now(), &self.registry)
    }

    fn fund(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        funder: &Address,
        transaction: Option<TxReference>,
    ) -> Result<SwapRecord, EscrowError> {
        self.ledger(kind)
            .fund(hashlock, funder, transaction, self.clock.now(), &self.registry)
    }

    fn claim(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        secret: &SecureSecret,
    ) -> Result<Settlement, EscrowError> {
        self.ledger(kind).claim(hashlock, secret, self.clock.now())
    }

    fn refund(&self, kind: &str, hashlock: &Hash) -> Result<Settlement, EscrowError> {
        self.refunds.refund(kind, hashlock, self.clock.now())
    }

    fn refund_expired(&self, kind: LedgerKind) -> SweepReport {
        self.refunds.refund_expired(kind, self.clock.now())
    }

    fn set_whitelist(
        &self,
        caller: &Address,
        resolver: Address,
        enabled: bool,
    ) -> Result<bool, EscrowError> {
        self.registry.set_whitelist(caller, resolver, enabled)
    }

    fn is_whitelisted(&self, resolver: &Address) -> bool {
        self.registry.is_whitelisted(resolver)
    }

    fn resolvers(&self) -> Vec<Resolver> {
        self.registry.resolvers()
    }

    fn get(&self, kind: LedgerKind, hashlock: &Hash) -> Option<SwapRecord> {
        self.ledger(kind).get(hashlock)
    }
}
