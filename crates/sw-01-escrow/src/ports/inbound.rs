//! # Inbound Ports
//!
//! What the escrow subsystem offers to the coordinator.

use crate::domain::{CreateParams, EscrowError, Resolver, SecureSecret, Settlement, SwapRecord};
use crate::refund::SweepReport;
use shared_types::{Address, Hash, LedgerKind, TxReference};

/// Escrow API - inbound port.
///
/// Every call reads the current time from the service's `TimeSource`.
pub trait EscrowApi: Send + Sync {
    /// Create a record in the selected ledger.
    fn create(&self, kind: LedgerKind, params: CreateParams) -> Result<Hash, EscrowError>;

    /// Whether `funder` may lock the record with a new funding transaction.
    fn check_lock(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        funder: &Address,
    ) -> Result<(), EscrowError>;

    /// Record `funder`'s unconfirmed funding transaction.
    fn mark_locked(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        funder: &Address,
        transaction: TxReference,
    ) -> Result<bool, EscrowError>;

    /// Fund the counter-leg.
    fn fund(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        funder: &Address,
        transaction: Option<TxReference>,
    ) -> Result<SwapRecord, EscrowError>;

    /// Claim with the preimage.
    fn claim(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        secret: &SecureSecret,
    ) -> Result<Settlement, EscrowError>;

    /// Refund through the refund manager. `kind` is the raw selector.
    fn refund(&self, kind: &str, hashlock: &Hash) -> Result<Settlement, EscrowError>;

    /// Refund every expired record of a ledger.
    fn refund_expired(&self, kind: LedgerKind) -> SweepReport;

    /// Update the resolver whitelist.
    fn set_whitelist(
        &self,
        caller: &Address,
        resolver: Address,
        enabled: bool,
    ) -> Result<bool, EscrowError>;

    /// Whether a resolver may fund.
    fn is_whitelisted(&self, resolver: &Address) -> bool;

    /// Registry listing.
    fn resolvers(&self) -> Vec<Resolver>;

    /// Record snapshot.
    fn get(&self, kind: LedgerKind, hashlock: &Hash) -> Option<SwapRecord>;
}
