//! # Escrow and Order Ledgers
//!
//! One generic keyed store, instantiated once per ledger kind.
//!
//! ## State Machine
//!
//! ```text
//! Created ──mark_locked──→ Locked ──fund──→ Funded ──claim──→ Claimed
//!    │  └──────────────fund──────────────────↗  │
//!    └────────────── refund (now >= timelock) ──┴─────────→ Refunded
//! ```
//!
//! ## Locking
//!
//! The map of records sits behind a read-mostly `RwLock`; every record has
//! its own `Mutex`. Creation takes the map write lock. Transitions take the
//! map read lock just long enough to clone the record handle, then hold only
//! that record's mutex while validating, mutating and publishing. Two
//! transitions on one hashlock are therefore serialized, and the event order
//! on the notifier matches the order the transitions were applied.

use super::entities::{CreateParams, Settlement, SettlementAction, SwapRecord};
use super::errors::EscrowError;
use super::invariants::{
    invariant_awaiting_funds, invariant_claimable, invariant_funder_allowed, invariant_lockable,
    invariant_refundable, invariant_valid_creation,
};
use super::registry::ResolverRegistry;
use super::secure_secret::SecureSecret;
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, StatusTransition, SwapEvent};
use shared_types::{
    short_hex, Address, EscrowStatus, Hash, LedgerKind, Timestamp, TxReference,
};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Compile-time ledger flavour.
pub trait LedgerKindMarker: Send + Sync + 'static {
    /// Which ledger this is.
    const KIND: LedgerKind;

    /// Whether source and destination chain must match.
    const SAME_CHAIN: bool;

    /// Who receives the funds when a record is refunded.
    fn refund_recipient(record: &SwapRecord) -> Address;
}

/// Cross-chain escrow leg.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscrowKind;

impl LedgerKindMarker for EscrowKind {
    const KIND: LedgerKind = LedgerKind::Escrow;
    const SAME_CHAIN: bool = false;

    /// The escrow only ever holds the maker's deposit.
    fn refund_recipient(record: &SwapRecord) -> Address {
        record.maker.clone()
    }
}

/// Same-chain order leg.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderKind;

impl LedgerKindMarker for OrderKind {
    const KIND: LedgerKind = LedgerKind::Order;
    const SAME_CHAIN: bool = true;

    /// Before funding the maker is repaid; once funded, the funder's fill is
    /// what the order holds.
    fn refund_recipient(record: &SwapRecord) -> Address {
        match (&record.status, &record.funder) {
            (EscrowStatus::Funded, Some(funder)) => funder.clone(),
            _ => record.maker.clone(),
        }
    }
}

/// Operations every ledger supports.
///
/// Object safe, so callers holding both ledgers can pick one by
/// `LedgerKind` at runtime.
pub trait SwapLedger: Send + Sync {
    /// Which ledger this is.
    fn kind(&self) -> LedgerKind;

    /// Insert a new `Created` record.
    ///
    /// # Errors
    ///
    /// In order: `InvalidAmount`, `InvalidTimelock`, `InvalidChainPair`,
    /// `ResolverNotWhitelisted`, `DuplicateHashlock`.
    fn create(
        &self,
        params: CreateParams,
        now: Timestamp,
        registry: &ResolverRegistry,
    ) -> Result<Hash, EscrowError>;

    /// Check that `funder` could lock the record with a new transaction,
    /// without changing anything.
    ///
    /// # Errors
    ///
    /// `NotFound`, then the `mark_locked` status and funder errors.
    fn check_lock(
        &self,
        hashlock: &Hash,
        funder: &Address,
        registry: &ResolverRegistry,
    ) -> Result<(), EscrowError>;

    /// Record that `funder`'s funding transaction was observed but not yet
    /// confirmed. Only that funder may fund the record afterwards.
    ///
    /// Returns `false` when the record was already locked by the same
    /// funder and transaction (no transition, no event).
    ///
    /// # Errors
    ///
    /// In order: `NotFound`, `AlreadyLocked` / `AlreadyFunded` /
    /// `AlreadyFinalized`, `ResolverNotWhitelisted`, `Unauthorized`.
    fn mark_locked(
        &self,
        hashlock: &Hash,
        funder: &Address,
        transaction: TxReference,
        now: Timestamp,
        registry: &ResolverRegistry,
    ) -> Result<bool, EscrowError>;

    /// Fund the counter-leg. `Created | Locked → Funded`.
    fn fund(
        &self,
        hashlock: &Hash,
        funder: &Address,
        transaction: Option<TxReference>,
        now: Timestamp,
        registry: &ResolverRegistry,
    ) -> Result<SwapRecord, EscrowError>;

    /// Claim with the preimage. `Funded → Claimed`.
    fn claim(
        &self,
        hashlock: &Hash,
        secret: &SecureSecret,
        now: Timestamp,
    ) -> Result<Settlement, EscrowError>;

    /// Refund after expiry. `Created | Locked | Funded → Refunded`.
    fn refund(&self, hashlock: &Hash, now: Timestamp) -> Result<Settlement, EscrowError>;

    /// Snapshot of one record.
    fn get(&self, hashlock: &Hash) -> Option<SwapRecord>;

    /// Current status of one record.
    fn status(&self, hashlock: &Hash) -> Option<EscrowStatus>;

    /// Number of records.
    fn len(&self) -> usize;

    /// No records at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots of every record in `status`.
    fn list_by_status(&self, status: EscrowStatus) -> Vec<SwapRecord>;

    /// Hashlocks of records refundable at `now`.
    fn expired(&self, now: Timestamp) -> Vec<Hash>;
}

type Slot = Arc<Mutex<SwapRecord>>;

/// Keyed store of swap records.
pub struct Ledger<K: LedgerKindMarker> {
    records: RwLock<HashMap<Hash, Slot>>,
    publisher: Arc<dyn EventPublisher>,
    _kind: PhantomData<fn() -> K>,
}

/// Cross-chain escrow ledger.
pub type EscrowLedger = Ledger<EscrowKind>;

/// Same-chain order ledger.
pub type OrderLedger = Ledger<OrderKind>;

impl<K: LedgerKindMarker> Ledger<K> {
    /// Create an empty ledger publishing transitions to `publisher`.
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            publisher,
            _kind: PhantomData,
        }
    }

    fn slot(&self, hashlock: &Hash) -> Result<Slot, EscrowError> {
        self.records
            .read()
            .get(hashlock)
            .cloned()
            .ok_or(EscrowError::NotFound(*hashlock))
    }

    fn publish(&self, record: &SwapRecord, previous: Option<EscrowStatus>) {
        self.publisher
            .publish(SwapEvent::StatusChanged(StatusTransition {
                kind: K::KIND,
                hashlock: record.hashlock,
                previous,
                current: record.status,
                timestamp: record.updated_at,
                transaction_reference: record.funding_tx.clone(),
            }));
    }

    fn settle(record: &SwapRecord, action: SettlementAction, recipient: Address) -> Settlement {
        Settlement {
            kind: K::KIND,
            hashlock: record.hashlock,
            action,
            recipient,
            asset: record.asset.clone(),
            amount: record.amount,
            chain: record.source_chain,
            settled_at: record.updated_at,
        }
    }
}

impl<K: LedgerKindMarker> SwapLedger for Ledger<K> {
    fn kind(&self) -> LedgerKind {
        K::KIND
    }

    fn create(
        &self,
        params: CreateParams,
        now: Timestamp,
        registry: &ResolverRegistry,
    ) -> Result<Hash, EscrowError> {
        invariant_valid_creation(&params, now, K::SAME_CHAIN)?;
        if let Some(resolver) = &params.resolver {
            if !registry.is_whitelisted(resolver) {
                return Err(EscrowError::ResolverNotWhitelisted(resolver.clone()));
            }
        }

        let hashlock = params.hashlock;
        let mut records = self.records.write();
        if records.contains_key(&hashlock) {
            return Err(EscrowError::DuplicateHashlock(hashlock));
        }

        let record = SwapRecord::new(K::KIND, params, now);
        info!(
            kind = %K::KIND,
            hashlock = %short_hex(&hashlock),
            maker = %record.maker,
            amount = %record.amount,
            timelock = record.timelock,
            "Record created"
        );
        // Published under the map lock so no transition event can precede it.
        self.publish(&record, None);
        records.insert(hashlock, Arc::new(Mutex::new(record)));
        Ok(hashlock)
    }

    fn check_lock(
        &self,
        hashlock: &Hash,
        funder: &Address,
        registry: &ResolverRegistry,
    ) -> Result<(), EscrowError> {
        let slot = self.slot(hashlock)?;
        let record = slot.lock();
        invariant_lockable(&record)?;
        invariant_funder_allowed(&record, funder, registry)
    }

    fn mark_locked(
        &self,
        hashlock: &Hash,
        funder: &Address,
        transaction: TxReference,
        now: Timestamp,
        registry: &ResolverRegistry,
    ) -> Result<bool, EscrowError> {
        let slot = self.slot(hashlock)?;
        let mut record = slot.lock();

        if record.status == EscrowStatus::Locked
            && record.funder.as_ref() == Some(funder)
            && record.funding_tx.as_ref() == Some(&transaction)
        {
            return Ok(false);
        }
        invariant_lockable(&record)?;
        invariant_funder_allowed(&record, funder, registry)?;

        let previous = record.status;
        record.status = EscrowStatus::Locked;
        record.funder = Some(funder.clone());
        record.funding_tx = Some(transaction);
        record.updated_at = now;
        debug!(kind = %K::KIND, hashlock = %short_hex(hashlock), funder = %funder, "Funding observed");
        self.publish(&record, Some(previous));
        Ok(true)
    }

    fn fund(
        &self,
        hashlock: &Hash,
        funder: &Address,
        transaction: Option<TxReference>,
        now: Timestamp,
        registry: &ResolverRegistry,
    ) -> Result<SwapRecord, EscrowError> {
        let slot = self.slot(hashlock)?;
        let mut record = slot.lock();

        invariant_awaiting_funds(&record)?;
        invariant_funder_allowed(&record, funder, registry)?;

        let previous = record.status;
        record.status = EscrowStatus::Funded;
        record.resolver = Some(funder.clone());
        record.funder = Some(funder.clone());
        if transaction.is_some() {
            record.funding_tx = transaction;
        }
        record.updated_at = now;
        info!(
            kind = %K::KIND,
            hashlock = %short_hex(hashlock),
            funder = %funder,
            "Record funded"
        );
        self.publish(&record, Some(previous));
        Ok(record.clone())
    }

    fn claim(
        &self,
        hashlock: &Hash,
        secret: &SecureSecret,
        now: Timestamp,
    ) -> Result<Settlement, EscrowError> {
        let slot = self.slot(hashlock)?;
        let mut record = slot.lock();

        invariant_claimable(&record, secret.as_bytes())?;

        let previous = record.status;
        record.status = EscrowStatus::Claimed;
        record.revealed_secret = Some(secret.expose());
        record.updated_at = now;
        let recipient = record
            .funder
            .clone()
            .unwrap_or_else(|| record.maker.clone());
        info!(
            kind = %K::KIND,
            hashlock = %short_hex(hashlock),
            recipient = %recipient,
            "Record claimed"
        );
        self.publish(&record, Some(previous));
        Ok(Self::settle(&record, SettlementAction::Claim, recipient))
    }

    fn refund(&self, hashlock: &Hash, now: Timestamp) -> Result<Settlement, EscrowError> {
        let slot = self.slot(hashlock)?;
        let mut record = slot.lock();

        invariant_refundable(&record, now)?;

        // Recipient depends on the status being left.
        let recipient = K::refund_recipient(&record);
        let previous = record.status;
        record.status = EscrowStatus::Refunded;
        record.updated_at = now;
        info!(
            kind = %K::KIND,
            hashlock = %short_hex(hashlock),
            from = %previous,
            recipient = %recipient,
            "Record refunded"
        );
        self.publish(&record, Some(previous));
        Ok(Self::settle(&record, SettlementAction::Refund, recipient))
    }

    fn get(&self, hashlock: &Hash) -> Option<SwapRecord> {
        let slot = self.records.read().get(hashlock).cloned()?;
        let record = slot.lock().clone();
        Some(record)
    }

    fn status(&self, hashlock: &Hash) -> Option<EscrowStatus> {
        let slot = self.records.read().get(hashlock).cloned()?;
        let status = slot.lock().status;
        Some(status)
    }

    fn len(&self) -> usize {
        self.records.read().len()
    }

    fn list_by_status(&self, status: EscrowStatus) -> Vec<SwapRecord> {
        self.records
            .read()
            .values()
            .filter_map(|slot| {
                let record = slot.lock();
                (record.status == status).then(|| record.clone())
            })
            .collect()
    }

    fn expired(&self, now: Timestamp) -> Vec<Hash> {
        self.records
            .read()
            .values()
            .filter_map(|slot| {
                let record = slot.lock();
                record.is_refundable(now).then_some(record.hashlock)
            })
            .collect()
    }
}
