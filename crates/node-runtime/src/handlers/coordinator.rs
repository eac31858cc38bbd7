//! # Request Coordinator
//!
//! Single entry point for inbound requests. Every request goes through the
//! same pipeline:
//!
//! ```text
//! JSON ──parse──→ Envelope<SwapMessage> ──signature──→ replay guard ──→ dispatch ──→ SwapResponse
//! ```
//!
//! The envelope `sender` is the caller for every authorization decision.
//! Operations marked signed are refused unless the envelope carries a valid
//! HMAC under the sender's shared key. Any attached signature is checked,
//! and a rejected signature does not consume the correlation id.
//!
//! | Operation | Signed | Who may call |
//! |-----------|--------|--------------|
//! | `Lock`, `Create` | yes | anyone with a key; the sender becomes the maker |
//! | `SetWhiteList` | yes | the administrator |
//! | `Fund` | yes | the named funder, or the administrator |
//! | `TrackFunding` | yes | a funder allowed to fund the record |
//! | `Claim` | no | anyone holding the secret |
//! | `Refund`, `RefundOrder` | no | anyone, once expired |
//! | `Status` | no | anyone |

use crate::adapters::{ReplayError, ReplayGuard};
use crate::handlers::funding_watcher::FundingWatcher;
use crate::handlers::messages::{parse_envelope, parse_hash, MessageError, SwapMessage};
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{hash_to_hex, Address, Envelope, Hash, LedgerKind, SecurityError, SenderKeys};
use std::sync::Arc;
use sw_01_escrow::{EscrowApi, EscrowError, EscrowService, Settlement, SwapRecord};
use sw_02_chain_relayer::RecordRef;
use swap_telemetry::metrics::{COORDINATOR_REQUESTS, LEDGER_FAILURES};
use swap_telemetry::{log_swap_event, metric_inc};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// Malformed or unsupported message.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Missing, unknown or wrong signature.
    #[error(transparent)]
    Auth(#[from] SecurityError),

    /// Stale or replayed envelope.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// Rejected by the escrow subsystem.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// No chain relayer is configured.
    #[error("Funding transactions cannot be tracked: relayer disabled")]
    RelayerDisabled,
}

impl CoordinatorError {
    /// Stable code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::Message(e) => e.code(),
            CoordinatorError::Auth(e) => e.code(),
            CoordinatorError::Replay(e) => e.code(),
            CoordinatorError::Escrow(e) => e.code(),
            CoordinatorError::RelayerDisabled => "relayer_disabled",
        }
    }
}

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A record was created.
    Created {
        /// Ledger.
        kind: LedgerKind,
        /// Record key.
        hashlock: Hash,
    },
    /// Funds released or returned.
    Settled(Settlement),
    /// Whitelist call accepted.
    WhitelistUpdated {
        /// Resolver updated.
        resolver: Address,
        /// New flag.
        enabled: bool,
        /// Whether the flag actually changed.
        changed: bool,
    },
    /// Counter-leg funded.
    Funded(SwapRecord),
    /// Funding transaction accepted and watched.
    Locked(SwapRecord),
    /// Record snapshot.
    Status(SwapRecord),
}

impl Outcome {
    /// JSON body for the response `result` field.
    pub fn to_json(&self) -> Value {
        match self {
            Outcome::Created { kind, hashlock } => json!({
                "kind": kind,
                "hash": hash_to_hex(hashlock),
                "status": "created",
            }),
            Outcome::Settled(settlement) => json!({
                "kind": settlement.kind,
                "hash": hash_to_hex(&settlement.hashlock),
                "action": settlement.action,
                "recipient": settlement.recipient,
                "asset": settlement.asset,
                "amount": settlement.amount.to_string(),
                "chainId": settlement.chain,
                "settledAt": settlement.settled_at,
            }),
            Outcome::WhitelistUpdated {
                resolver,
                enabled,
                changed,
            } => json!({
                "resolver": resolver,
                "whitelistStatus": enabled,
                "changed": changed,
            }),
            Outcome::Funded(record) | Outcome::Locked(record) | Outcome::Status(record) => {
                record_json(record)
            }
        }
    }
}

fn record_json(record: &SwapRecord) -> Value {
    json!({
        "kind": record.kind,
        "hash": hash_to_hex(&record.hashlock),
        "status": record.status,
        "maker": record.maker,
        "resolver": record.resolver,
        "receiver": record.receiver,
        "funder": record.funder,
        "sourceChainId": record.source_chain,
        "destChainId": record.destination_chain,
        "asset": record.asset,
        "amount": record.amount.to_string(),
        "timelock": record.timelock,
        "transactionReference": record.funding_tx,
        "secret": record.revealed_secret.map(hex::encode),
        "createdAt": record.created_at,
        "updatedAt": record.updated_at,
    })
}

/// Error body of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Wire response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapResponse {
    /// Echo of the request's correlation id, if it could be parsed.
    pub correlation_id: Option<Uuid>,
    /// Whether the request succeeded.
    pub ok: bool,
    /// Operation result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl SwapResponse {
    fn from_result(
        correlation_id: Option<Uuid>,
        result: Result<Outcome, CoordinatorError>,
    ) -> Self {
        match result {
            Ok(outcome) => Self {
                correlation_id,
                ok: true,
                result: Some(outcome.to_json()),
                error: None,
            },
            Err(e) => Self {
                correlation_id,
                ok: false,
                result: None,
                error: Some(ErrorBody {
                    code: e.code().to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

/// Routes envelopes to the escrow subsystem.
pub struct RequestCoordinator {
    escrow: Arc<EscrowService>,
    replay: Arc<ReplayGuard>,
    keys: SenderKeys,
    funding: Option<Arc<FundingWatcher>>,
}

impl RequestCoordinator {
    /// Create a coordinator that verifies signatures against `keys`.
    pub fn new(escrow: Arc<EscrowService>, replay: Arc<ReplayGuard>, keys: SenderKeys) -> Self {
        Self {
            escrow,
            replay,
            keys,
            funding: None,
        }
    }

    /// Route `TrackFunding` to `watcher`.
    pub fn with_funding_watcher(mut self, watcher: Arc<FundingWatcher>) -> Self {
        self.funding = Some(watcher);
        self
    }

    /// Parse and handle a raw JSON request. Never fails; errors are
    /// reported in the response.
    pub fn handle_json(&self, raw: &str) -> SwapResponse {
        match parse_envelope(raw) {
            Ok(envelope) => {
                let correlation_id = envelope.correlation_id;
                SwapResponse::from_result(Some(correlation_id), self.handle(envelope))
            }
            Err(e) => {
                metric_inc!(COORDINATOR_REQUESTS, &["unknown", "rejected"]);
                debug!(error = %e, "Rejected unparseable request");
                SwapResponse::from_result(None, Err(e.into()))
            }
        }
    }

    /// Handle a parsed envelope.
    ///
    /// # Errors
    ///
    /// Version, signature, replay and escrow rejections. A rejected request
    /// changes no ledger state.
    pub fn handle(&self, envelope: Envelope<SwapMessage>) -> Result<Outcome, CoordinatorError> {
        let op = envelope.payload.op();
        let result = self.process(envelope);
        match &result {
            Ok(_) => metric_inc!(COORDINATOR_REQUESTS, &[op, "ok"]),
            Err(e) => {
                metric_inc!(COORDINATOR_REQUESTS, &[op, "rejected"]);
                if let CoordinatorError::Escrow(escrow) = e {
                    metric_inc!(LEDGER_FAILURES, &[op, escrow.code()]);
                }
                warn!(op = op, code = e.code(), error = %e, "Request rejected");
            }
        }
        result
    }

    fn process(&self, envelope: Envelope<SwapMessage>) -> Result<Outcome, CoordinatorError> {
        if !envelope.is_supported_version() {
            return Err(MessageError::UnsupportedVersion(envelope.version).into());
        }
        self.authenticate(&envelope)?;
        self.replay
            .check(envelope.correlation_id, envelope.timestamp)?;

        let sender = envelope.sender;
        match envelope.payload {
            SwapMessage::Lock(lock) => {
                let hashlock = self
                    .escrow
                    .create(LedgerKind::Escrow, lock.to_params(&sender)?)?;
                Ok(Outcome::Created {
                    kind: LedgerKind::Escrow,
                    hashlock,
                })
            }
            SwapMessage::Create(create) => {
                let hashlock = self
                    .escrow
                    .create(LedgerKind::Order, create.to_params(&sender)?)?;
                Ok(Outcome::Created {
                    kind: LedgerKind::Order,
                    hashlock,
                })
            }
            SwapMessage::Refund(refund) => {
                self.settle_refund(LedgerKind::Escrow, &refund.hashlock()?, &sender)
            }
            SwapMessage::RefundOrder(refund) => {
                self.settle_refund(LedgerKind::Order, &refund.hashlock()?, &sender)
            }
            SwapMessage::SetWhiteList(update) => {
                let changed = self.escrow.set_whitelist(
                    &sender,
                    update.resolver.clone(),
                    update.whitelist_status,
                )?;
                Ok(Outcome::WhitelistUpdated {
                    resolver: update.resolver,
                    enabled: update.whitelist_status,
                    changed,
                })
            }
            SwapMessage::Fund(fund) => {
                let hashlock = parse_hash(&fund.hash)?;
                if sender != fund.funder && &sender != self.escrow.registry().admin() {
                    return Err(EscrowError::Unauthorized(sender).into());
                }
                let record = self.escrow.fund(
                    fund.kind,
                    &hashlock,
                    &fund.funder,
                    fund.transaction_reference,
                )?;
                log_swap_event!(info, "coordinator", "Counter-leg funded", fund.kind, hash_to_hex(&hashlock), funder = %fund.funder);
                Ok(Outcome::Funded(record))
            }
            SwapMessage::TrackFunding(track) => {
                let hashlock = parse_hash(&track.hash)?;
                let watcher = self
                    .funding
                    .as_ref()
                    .ok_or(CoordinatorError::RelayerDisabled)?;
                let watching = watcher.track_funding(
                    track.transaction_reference.clone(),
                    RecordRef::new(track.kind, hashlock),
                    sender.clone(),
                )?;
                log_swap_event!(info, "coordinator", "Funding transaction tracked", track.kind, hash_to_hex(&hashlock), funder = %sender, tx_id = %track.transaction_reference, new = watching);
                self.escrow
                    .get(track.kind, &hashlock)
                    .map(Outcome::Locked)
                    .ok_or_else(|| EscrowError::NotFound(hashlock).into())
            }
            SwapMessage::Claim(claim) => {
                let hashlock = parse_hash(&claim.hash)?;
                let secret = claim.secret()?;
                let settlement = self.escrow.claim(claim.kind, &hashlock, &secret)?;
                log_swap_event!(info, "coordinator", "Record claimed", claim.kind, hash_to_hex(&hashlock), recipient = %settlement.recipient);
                Ok(Outcome::Settled(settlement))
            }
            SwapMessage::Status(query) => {
                let hashlock = parse_hash(&query.hash)?;
                self.escrow
                    .get(query.kind, &hashlock)
                    .map(Outcome::Status)
                    .ok_or_else(|| EscrowError::NotFound(hashlock).into())
            }
        }
    }

    fn authenticate(&self, envelope: &Envelope<SwapMessage>) -> Result<(), SecurityError> {
        if !envelope.is_signed() {
            return if envelope.payload.requires_signature() {
                Err(SecurityError::MissingSignature)
            } else {
                Ok(())
            };
        }
        let key = self
            .keys
            .get(&envelope.sender)
            .ok_or_else(|| SecurityError::UnknownSender(envelope.sender.clone()))?;
        envelope.verify_signature(key)
    }

    fn settle_refund(
        &self,
        kind: LedgerKind,
        hashlock: &Hash,
        sender: &Address,
    ) -> Result<Outcome, CoordinatorError> {
        let settlement = self.escrow.refund(kind.as_str(), hashlock)?;
        log_swap_event!(info, "coordinator", "Record refunded", kind, hash_to_hex(hashlock), caller = %sender, recipient = %settlement.recipient);
        Ok(Outcome::Settled(settlement))
    }
}
