//! # Swap Messages
//!
//! The closed set of operations the coordinator accepts, as JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "sender": "EQmaker...",
//!   "correlation_id": "6f1c...",
//!   "timestamp": 1700000000,
//!   "payload": { "op": "Lock", "payload": { "hash": "ab..", "sourceChainId": -3, ... } },
//!   "signature": "9b0e..."
//! }
//! ```
//!
//! Unknown operations, unknown fields and missing required fields are
//! rejected here, before anything reaches a ledger. The caller identity is
//! the envelope's `sender`; payloads never carry it. Operations that act on
//! that identity need a `signature` (see `SwapMessage::requires_signature`).

use serde::{Deserialize, Deserializer, Serialize};
use shared_types::{Address, Amount, ChainId, Envelope, Hash, LedgerKind, Timestamp, TxReference};
use sw_01_escrow::{parse_hash_hex, parse_secret_hex, CreateParams, SecureSecret};
use thiserror::Error;

/// Boundary parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Malformed JSON, unknown operation, or unknown/missing field.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Envelope version this node does not speak.
    #[error("Unsupported envelope version {0}")]
    UnsupportedVersion(u16),
}

impl MessageError {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            MessageError::InvalidMessage(_) => "invalid_message",
            MessageError::UnsupportedVersion(_) => "unsupported_version",
        }
    }
}

/// Every operation the coordinator accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", deny_unknown_fields)]
pub enum SwapMessage {
    /// Create a cross-chain escrow.
    Lock(LockPayload),
    /// Create a same-chain order.
    Create(CreatePayload),
    /// Refund an escrow.
    Refund(RefundPayload),
    /// Refund an order.
    RefundOrder(RefundPayload),
    /// Change a resolver's whitelist flag.
    SetWhiteList(SetWhiteListPayload),
    /// Fund the counter-leg.
    Fund(FundPayload),
    /// Lock a record with the sender's broadcast funding transaction and
    /// fund it once confirmed.
    TrackFunding(TrackFundingPayload),
    /// Claim with the secret.
    Claim(ClaimPayload),
    /// Query a record.
    Status(StatusPayload),
}

impl SwapMessage {
    /// Operation name, as it appears on the wire.
    pub fn op(&self) -> &'static str {
        match self {
            SwapMessage::Lock(_) => "Lock",
            SwapMessage::Create(_) => "Create",
            SwapMessage::Refund(_) => "Refund",
            SwapMessage::RefundOrder(_) => "RefundOrder",
            SwapMessage::SetWhiteList(_) => "SetWhiteList",
            SwapMessage::Fund(_) => "Fund",
            SwapMessage::TrackFunding(_) => "TrackFunding",
            SwapMessage::Claim(_) => "Claim",
            SwapMessage::Status(_) => "Status",
        }
    }

    /// Whether the sender's identity decides the outcome, so the envelope
    /// must be signed with the sender's key.
    pub fn requires_signature(&self) -> bool {
        match self {
            SwapMessage::Lock(_)
            | SwapMessage::Create(_)
            | SwapMessage::SetWhiteList(_)
            | SwapMessage::Fund(_)
            | SwapMessage::TrackFunding(_) => true,
            SwapMessage::Refund(_)
            | SwapMessage::RefundOrder(_)
            | SwapMessage::Claim(_)
            | SwapMessage::Status(_) => false,
        }
    }
}

/// `Lock`: escrow creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LockPayload {
    /// Hashlock, hex.
    pub hash: String,
    /// Chain the maker locks on.
    pub source_chain_id: i64,
    /// Chain the counter-leg settles on.
    pub dest_chain_id: i64,
    /// Asset identifier.
    pub asset: String,
    /// Recipient on the destination chain.
    pub receiver: Address,
    /// Absolute expiry, unix seconds.
    pub timelock: Timestamp,
    /// Amount, as a JSON integer or decimal string.
    #[serde(deserialize_with = "amount_from_json", serialize_with = "amount_to_json")]
    pub amount: Amount,
    /// Resolver chosen up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<Address>,
    /// Opaque bytes, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_payload: Option<String>,
}

impl LockPayload {
    /// Creation parameters, with `sender` as maker.
    pub fn to_params(&self, sender: &Address) -> Result<CreateParams, MessageError> {
        Ok(CreateParams {
            hashlock: parse_hash(&self.hash)?,
            maker: sender.clone(),
            resolver: self.resolver.clone(),
            receiver: Some(self.receiver.clone()),
            source_chain: ChainId(self.source_chain_id),
            destination_chain: ChainId(self.dest_chain_id),
            asset: self.asset.clone(),
            amount: self.amount,
            timelock: self.timelock,
            custom_payload: parse_payload(self.custom_payload.as_deref())?,
        })
    }
}

/// `Create`: same-chain order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePayload {
    /// Hashlock, hex.
    pub hash: String,
    /// Chain of both legs.
    pub chain_id: i64,
    /// Asset identifier.
    pub asset: String,
    /// Absolute expiry, unix seconds.
    pub timelock: Timestamp,
    /// Amount, as a JSON integer or decimal string.
    #[serde(deserialize_with = "amount_from_json", serialize_with = "amount_to_json")]
    pub amount: Amount,
    /// Resolver chosen up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<Address>,
}

impl CreatePayload {
    /// Creation parameters, with `sender` as maker.
    pub fn to_params(&self, sender: &Address) -> Result<CreateParams, MessageError> {
        let mut params = CreateParams::order(
            parse_hash(&self.hash)?,
            sender.clone(),
            ChainId(self.chain_id),
            self.asset.clone(),
            self.amount,
            self.timelock,
        );
        params.resolver = self.resolver.clone();
        Ok(params)
    }
}

/// `Refund` / `RefundOrder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RefundPayload {
    /// Hashlock, hex.
    pub hash: String,
    /// Opaque bytes, hex. Must decode; the ledger does not use them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_payload: Option<String>,
}

impl RefundPayload {
    /// Decode the hashlock and check `custom_payload` is hex.
    pub fn hashlock(&self) -> Result<Hash, MessageError> {
        parse_payload(self.custom_payload.as_deref())?;
        parse_hash(&self.hash)
    }
}

/// `SetWhiteList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetWhiteListPayload {
    /// Resolver to update.
    pub resolver: Address,
    /// New flag.
    pub whitelist_status: bool,
}

/// `Fund`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FundPayload {
    /// Ledger.
    pub kind: LedgerKind,
    /// Hashlock, hex.
    pub hash: String,
    /// Resolver funding the counter-leg.
    pub funder: Address,
    /// Funding transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<TxReference>,
}

/// `TrackFunding`. The funder is the envelope sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrackFundingPayload {
    /// Ledger.
    pub kind: LedgerKind,
    /// Hashlock, hex.
    pub hash: String,
    /// Broadcast funding transaction id.
    pub transaction_reference: TxReference,
}

/// `Claim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClaimPayload {
    /// Ledger.
    pub kind: LedgerKind,
    /// Hashlock, hex.
    pub hash: String,
    /// Preimage, hex.
    pub secret: String,
}

impl ClaimPayload {
    /// Decode the secret.
    pub fn secret(&self) -> Result<SecureSecret, MessageError> {
        parse_secret_hex(&self.secret).map_err(|e| MessageError::InvalidMessage(e.to_string()))
    }
}

/// `Status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatusPayload {
    /// Ledger.
    pub kind: LedgerKind,
    /// Hashlock, hex.
    pub hash: String,
}

/// Parse a hashlock field.
pub fn parse_hash(value: &str) -> Result<Hash, MessageError> {
    parse_hash_hex(value).map_err(|e| MessageError::InvalidMessage(e.to_string()))
}

fn parse_payload(value: Option<&str>) -> Result<Option<Vec<u8>>, MessageError> {
    value
        .map(|v| {
            hex::decode(v.strip_prefix("0x").unwrap_or(v))
                .map_err(|e| MessageError::InvalidMessage(format!("customPayload: {e}")))
        })
        .transpose()
}

/// Parse a request envelope from JSON and check its version.
pub fn parse_envelope(raw: &str) -> Result<Envelope<SwapMessage>, MessageError> {
    let envelope: Envelope<SwapMessage> =
        serde_json::from_str(raw).map_err(|e| MessageError::InvalidMessage(e.to_string()))?;
    if !envelope.is_supported_version() {
        return Err(MessageError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(u64),
    Text(String),
}

fn amount_from_json<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Number(n) => Ok(Amount::from(n)),
        AmountRepr::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount {s:?}"))),
    }
}

fn amount_to_json<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&amount.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HASH: &str = "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925";

    fn envelope(payload: serde_json::Value) -> String {
        json!({
            "version": 1,
            "sender": "EQmaker",
            "correlation_id": "6f1c2a8e-4b4b-4f3e-9a43-0a4b7d1e2f30",
            "timestamp": 1_700_000_000u64,
            "payload": payload,
        })
        .to_string()
    }

    #[test]
    fn test_parse_lock() {
        let raw = envelope(json!({
            "op": "Lock",
            "payload": {
                "hash": HASH,
                "sourceChainId": -3,
                "destChainId": 1,
                "asset": "TON",
                "receiver": "0xreceiver",
                "timelock": 1_700_003_600u64,
                "amount": 1_000_000,
            }
        }));
        let env = parse_envelope(&raw).unwrap();
        let SwapMessage::Lock(lock) = &env.payload else {
            panic!("expected Lock");
        };
        let params = lock.to_params(&env.sender).unwrap();
        assert_eq!(params.maker.as_str(), "EQmaker");
        assert_eq!(params.source_chain, ChainId::TON_MAINNET);
        assert_eq!(params.destination_chain, ChainId::ETHEREUM);
        assert_eq!(params.amount, 1_000_000);
        assert_eq!(hex::encode(params.hashlock), HASH);
        assert_eq!(env.payload.op(), "Lock");
    }

    #[test]
    fn test_amount_accepts_string_beyond_u64() {
        let raw = envelope(json!({
            "op": "Create",
            "payload": {
                "hash": HASH,
                "chainId": 56,
                "asset": "BNB",
                "timelock": 1_700_003_600u64,
                "amount": "340282366920938463463374607431768211455",
            }
        }));
        let env = parse_envelope(&raw).unwrap();
        let SwapMessage::Create(create) = env.payload else {
            panic!("expected Create");
        };
        assert_eq!(create.amount, u128::MAX);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let raw = envelope(json!({ "op": "Withdraw", "payload": { "hash": HASH } }));
        assert!(matches!(
            parse_envelope(&raw),
            Err(MessageError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let raw = envelope(json!({
            "op": "Refund",
            "payload": { "hash": HASH, "recipient": "EQthief" }
        }));
        assert!(matches!(
            parse_envelope(&raw),
            Err(MessageError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let raw = envelope(json!({
            "op": "SetWhiteList",
            "payload": { "resolver": "EQresolver" }
        }));
        assert!(matches!(
            parse_envelope(&raw),
            Err(MessageError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_unknown_envelope_field_rejected() {
        let raw = json!({
            "version": 1,
            "sender": "EQmaker",
            "correlation_id": "6f1c2a8e-4b4b-4f3e-9a43-0a4b7d1e2f30",
            "timestamp": 1,
            "nonce": 7,
            "payload": { "op": "Status", "payload": { "kind": "escrow", "hash": HASH } },
        })
        .to_string();
        assert!(parse_envelope(&raw).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let raw = json!({
            "version": 9,
            "sender": "EQmaker",
            "correlation_id": "6f1c2a8e-4b4b-4f3e-9a43-0a4b7d1e2f30",
            "timestamp": 1,
            "payload": { "op": "Status", "payload": { "kind": "order", "hash": HASH } },
        })
        .to_string();
        assert_eq!(
            parse_envelope(&raw).unwrap_err(),
            MessageError::UnsupportedVersion(9)
        );
    }

    #[test]
    fn test_invalid_kind_rejected() {
        let raw = envelope(json!({
            "op": "Status",
            "payload": { "kind": "vault", "hash": HASH }
        }));
        assert!(parse_envelope(&raw).is_err());
    }

    #[test]
    fn test_bad_hash_reported_on_conversion() {
        let create = CreatePayload {
            hash: "0x1234".into(),
            chain_id: 1,
            asset: "ETH".into(),
            timelock: 10,
            amount: 1,
            resolver: None,
        };
        let sender = Address::new("EQmaker").unwrap();
        assert!(matches!(
            create.to_params(&sender),
            Err(MessageError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_custom_payload_hex() {
        assert_eq!(parse_payload(Some("0xbeef")).unwrap(), Some(vec![0xbe, 0xef]));
        assert_eq!(parse_payload(None).unwrap(), None);
        assert!(parse_payload(Some("zz")).is_err());
    }

    #[test]
    fn test_refund_custom_payload_must_be_hex() {
        let refund = |custom_payload: Option<&str>| RefundPayload {
            hash: HASH.into(),
            custom_payload: custom_payload.map(str::to_string),
        };
        assert!(refund(None).hashlock().is_ok());
        assert_eq!(hex::encode(refund(Some("0xbeef")).hashlock().unwrap()), HASH);
        assert!(matches!(
            refund(Some("not-hex")).hashlock(),
            Err(MessageError::InvalidMessage(msg)) if msg.contains("customPayload")
        ));
    }

    #[test]
    fn test_parse_track_funding() {
        let raw = envelope(json!({
            "op": "TrackFunding",
            "payload": { "kind": "order", "hash": HASH, "transactionReference": "ab01" }
        }));
        let env = parse_envelope(&raw).unwrap();
        let SwapMessage::TrackFunding(track) = &env.payload else {
            panic!("expected TrackFunding");
        };
        assert_eq!(track.kind, LedgerKind::Order);
        assert_eq!(track.transaction_reference, TxReference::new("ab01"));
        assert!(env.payload.requires_signature());

        let missing_tx = envelope(json!({
            "op": "TrackFunding",
            "payload": { "kind": "order", "hash": HASH }
        }));
        assert!(parse_envelope(&missing_tx).is_err());
    }

    #[test]
    fn test_identity_operations_require_signature() {
        let status = SwapMessage::Status(StatusPayload {
            kind: LedgerKind::Escrow,
            hash: HASH.into(),
        });
        let refund = SwapMessage::Refund(RefundPayload {
            hash: HASH.into(),
            custom_payload: None,
        });
        let whitelist = SwapMessage::SetWhiteList(SetWhiteListPayload {
            resolver: Address::new("EQresolver").unwrap(),
            whitelist_status: true,
        });
        let fund = SwapMessage::Fund(FundPayload {
            kind: LedgerKind::Escrow,
            hash: HASH.into(),
            funder: Address::new("EQresolver").unwrap(),
            transaction_reference: None,
        });
        assert!(!status.requires_signature());
        assert!(!refund.requires_signature());
        assert!(whitelist.requires_signature());
        assert!(fund.requires_signature());
    }

    #[test]
    fn test_signature_field_accepted() {
        let raw = json!({
            "version": 1,
            "sender": "EQmaker",
            "correlation_id": "6f1c2a8e-4b4b-4f3e-9a43-0a4b7d1e2f30",
            "timestamp": 1,
            "payload": { "op": "Status", "payload": { "kind": "escrow", "hash": HASH } },
            "signature": "00".repeat(32),
        })
        .to_string();
        assert_eq!(parse_envelope(&raw).unwrap().signature, Some("00".repeat(32)));
    }

    #[test]
    fn test_claim_secret_decoding() {
        let claim = ClaimPayload {
            kind: LedgerKind::Escrow,
            hash: HASH.into(),
            secret: "00".repeat(32),
        };
        assert_eq!(claim.secret().unwrap().expose(), [0u8; 32]);
    }

    #[test]
    fn test_message_roundtrip_uses_op_tag() {
        let msg = SwapMessage::SetWhiteList(SetWhiteListPayload {
            resolver: Address::new("EQresolver").unwrap(),
            whitelist_status: true,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["op"], "SetWhiteList");
        assert_eq!(value["payload"]["whitelistStatus"], true);
    }
}
