//! # Domain Entities
//!
//! The swap record shared by the escrow and order ledgers, its creation
//! parameters, and the settlement produced by claim and refund.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Amount, ChainId, EscrowStatus, Hash, LedgerKind, Secret, Timestamp, TxReference,
};

/// Parameters for creating a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateParams {
    /// Hashlock: SHA-256 of the maker's secret. Primary key.
    pub hashlock: Hash,
    /// Party locking funds.
    pub maker: Address,
    /// Resolver expected to fund the counter-leg, if chosen up front.
    pub resolver: Option<Address>,
    /// Recipient on the destination chain.
    pub receiver: Option<Address>,
    /// Chain the maker's funds are locked on.
    pub source_chain: ChainId,
    /// Chain the counter-leg settles on.
    pub destination_chain: ChainId,
    /// Asset identifier (token address or symbol).
    pub asset: String,
    /// Amount in the asset's smallest denomination.
    pub amount: Amount,
    /// Absolute expiry (unix seconds).
    pub timelock: Timestamp,
    /// Opaque bytes forwarded to the chain.
    pub custom_payload: Option<Vec<u8>>,
}

impl CreateParams {
    /// Parameters for a same-chain order.
    pub fn order(
        hashlock: Hash,
        maker: Address,
        chain: ChainId,
        asset: impl Into<String>,
        amount: Amount,
        timelock: Timestamp,
    ) -> Self {
        Self {
            hashlock,
            maker,
            resolver: None,
            receiver: None,
            source_chain: chain,
            destination_chain: chain,
            asset: asset.into(),
            amount,
            timelock,
            custom_payload: None,
        }
    }

    /// Name the resolver allowed to fund.
    pub fn with_resolver(mut self, resolver: Address) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// One escrow or order record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Ledger this record lives in.
    pub kind: LedgerKind,
    /// Primary key.
    pub hashlock: Hash,
    /// Party who locked funds.
    pub maker: Address,
    /// Resolver named at creation, replaced by the funder on funding.
    pub resolver: Option<Address>,
    /// Recipient on the destination chain.
    pub receiver: Option<Address>,
    /// Source chain.
    pub source_chain: ChainId,
    /// Destination chain.
    pub destination_chain: ChainId,
    /// Asset identifier.
    pub asset: String,
    /// Locked amount.
    pub amount: Amount,
    /// Absolute expiry.
    pub timelock: Timestamp,
    /// Current status.
    pub status: EscrowStatus,
    /// Opaque bytes supplied at creation.
    pub custom_payload: Option<Vec<u8>>,
    /// Resolver that funded the counter-leg.
    pub funder: Option<Address>,
    /// Funding transaction back-reference.
    pub funding_tx: Option<TxReference>,
    /// Secret revealed by the claim. Public once claimed.
    pub revealed_secret: Option<Secret>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the last transition.
    pub updated_at: Timestamp,
}

impl SwapRecord {
    /// Build a fresh `Created` record.
    pub fn new(kind: LedgerKind, params: CreateParams, now: Timestamp) -> Self {
        Self {
            kind,
            hashlock: params.hashlock,
            maker: params.maker,
            resolver: params.resolver,
            receiver: params.receiver,
            source_chain: params.source_chain,
            destination_chain: params.destination_chain,
            asset: params.asset,
            amount: params.amount,
            timelock: params.timelock,
            status: EscrowStatus::Created,
            custom_payload: params.custom_payload,
            funder: None,
            funding_tx: None,
            revealed_secret: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Timelock has passed (refund allowed from `now >= timelock`).
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.timelock
    }

    /// Refundable right now.
    pub fn is_refundable(&self, now: Timestamp) -> bool {
        self.is_expired(now) && !self.status.is_terminal()
    }
}

/// What a settlement pays out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementAction {
    /// Released to the funder against the secret.
    Claim,
    /// Returned after expiry.
    Refund,
}

/// Outcome of a claim or refund: who receives what.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Ledger the record lives in.
    pub kind: LedgerKind,
    /// Record key.
    pub hashlock: Hash,
    /// Claim or refund.
    pub action: SettlementAction,
    /// Party receiving the funds.
    pub recipient: Address,
    /// Asset released.
    pub asset: String,
    /// Amount released.
    pub amount: Amount,
    /// Chain the funds are released on.
    pub chain: ChainId,
    /// When the ledger settled.
    pub settled_at: Timestamp,
}
