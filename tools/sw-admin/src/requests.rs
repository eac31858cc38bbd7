//! Request builders.

use crate::deployments;
use crate::AdminError;
use node_runtime::handlers::messages::{
    CreatePayload, LockPayload, RefundPayload, SetWhiteListPayload, SwapMessage,
};
use serde::Serialize;
use shared_types::security::MIN_KEY_LEN;
use shared_types::{
    hash_to_hex, Address, ChainId, Envelope, Hash, LedgerKind, SecurityError, Timestamp,
};
use std::path::Path;
use sw_01_escrow::{generate_pair, parse_hash_hex, RefundManager};

/// Lifetime of the example records printed by `secret`.
pub const EXAMPLE_TIMELOCK_SECS: u64 = 3_600;

/// Amount used in the example records printed by `secret`.
pub const EXAMPLE_AMOUNT: u128 = 1_000_000;

/// Sender identity and, optionally, the key it shares with the node.
#[derive(Clone)]
pub struct Signer {
    sender: Address,
    key: Option<Vec<u8>>,
}

impl Signer {
    /// Produce unsigned envelopes.
    pub fn unsigned(sender: Address) -> Self {
        Self { sender, key: None }
    }

    /// Sign every envelope with `key`.
    ///
    /// # Errors
    ///
    /// `Signing` for keys shorter than `MIN_KEY_LEN`.
    pub fn with_key(sender: Address, key: Vec<u8>) -> Result<Self, AdminError> {
        if key.len() < MIN_KEY_LEN {
            return Err(SecurityError::InvalidKey(format!(
                "key is {} bytes, need at least {MIN_KEY_LEN}",
                key.len()
            ))
            .into());
        }
        Ok(Self {
            sender,
            key: Some(key),
        })
    }

    /// Sender of every envelope.
    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Whether envelopes get a signature.
    pub fn signs(&self) -> bool {
        self.key.is_some()
    }

    fn seal(&self, now: Timestamp, message: SwapMessage) -> Result<Envelope<SwapMessage>, AdminError> {
        let envelope = Envelope::new(self.sender.clone(), now, message);
        match &self.key {
            Some(key) => Ok(envelope.signed(key)?),
            None => Ok(envelope),
        }
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("sender", &self.sender)
            .field("signs", &self.signs())
            .finish()
    }
}

/// Decode a hex shared key, `0x` prefix optional.
pub fn parse_key(value: &str) -> Result<Vec<u8>, AdminError> {
    let value = value.trim();
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).map_err(|e| {
        AdminError::InvalidArgument {
            field: "key",
            reason: e.to_string(),
        }
    })
}

/// A validated request ready for submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedRequest {
    /// Target contract.
    pub contract: String,
    /// Chain of the target contract.
    pub chain_id: ChainId,
    /// Envelope to submit.
    pub request: Envelope<SwapMessage>,
}

impl PreparedRequest {
    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String, AdminError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Output of `secret`.
#[derive(Debug, Clone)]
pub struct SecretBundle {
    /// Secret, hex. Keep it private until claiming.
    pub secret: String,
    /// Hashlock, hex.
    pub hash: String,
    /// Example `Lock` envelope.
    pub lock: Envelope<SwapMessage>,
    /// Example `Create` envelope.
    pub create: Envelope<SwapMessage>,
    /// Example `Refund` envelope.
    pub refund: Envelope<SwapMessage>,
}

impl SecretBundle {
    /// Human-readable report.
    pub fn render(&self) -> Result<String, AdminError> {
        Ok(format!(
            "Secret:   {}\nHashlock: {}\n\nLock (escrow):\n{}\n\nCreate (order):\n{}\n\nRefund:\n{}\n",
            self.secret,
            self.hash,
            serde_json::to_string_pretty(&self.lock)?,
            serde_json::to_string_pretty(&self.create)?,
            serde_json::to_string_pretty(&self.refund)?,
        ))
    }
}

/// Fresh secret, its hashlock, and example requests using it.
///
/// # Errors
///
/// `Signing` if an envelope cannot be signed.
pub fn secret_bundle(signer: &Signer, now: Timestamp) -> Result<SecretBundle, AdminError> {
    let sender = signer.sender();
    let (secret, hashlock) = generate_pair();
    let hash = hash_to_hex(&hashlock);
    let timelock = now + EXAMPLE_TIMELOCK_SECS;

    let lock = SwapMessage::Lock(LockPayload {
        hash: hash.clone(),
        source_chain_id: ChainId::TON_MAINNET.0,
        dest_chain_id: ChainId::ETHEREUM.0,
        asset: "TON".to_string(),
        receiver: sender.clone(),
        timelock,
        amount: EXAMPLE_AMOUNT,
        resolver: None,
        custom_payload: None,
    });
    let create = SwapMessage::Create(CreatePayload {
        hash: hash.clone(),
        chain_id: ChainId::BSC.0,
        asset: "BNB".to_string(),
        timelock,
        amount: EXAMPLE_AMOUNT,
        resolver: None,
    });
    let refund = SwapMessage::Refund(RefundPayload {
        hash: hash.clone(),
        custom_payload: None,
    });

    Ok(SecretBundle {
        secret: secret.to_hex(),
        hash,
        lock: signer.seal(now, lock)?,
        create: signer.seal(now, create)?,
        refund: signer.seal(now, refund)?,
    })
}

/// Validate and build a refund request.
///
/// The deployment record and the kind are checked before anything else.
///
/// # Errors
///
/// `ContractNotDeployed`, `InvalidRefundKind`, or `InvalidArgument` for a
/// malformed hash.
pub fn refund_request(
    deployments_dir: &Path,
    contract: &str,
    kind: &str,
    hash: &str,
    signer: &Signer,
    now: Timestamp,
) -> Result<PreparedRequest, AdminError> {
    let deployment = deployments::require(deployments_dir, contract)?;
    let kind = RefundManager::parse_kind(kind)
        .map_err(|_| AdminError::InvalidRefundKind(kind.to_string()))?;
    let hashlock = parse_hash(hash)?;

    let payload = RefundPayload {
        hash: hash_to_hex(&hashlock),
        custom_payload: None,
    };
    let message = match kind {
        LedgerKind::Escrow => SwapMessage::Refund(payload),
        LedgerKind::Order => SwapMessage::RefundOrder(payload),
    };
    Ok(PreparedRequest {
        contract: deployment.address,
        chain_id: ChainId(deployment.chain_id),
        request: signer.seal(now, message)?,
    })
}

/// Validate and build a signed whitelist request.
///
/// # Errors
///
/// `ContractNotDeployed`, `InvalidArgument` for a malformed resolver, or
/// `MissingKey` when `signer` has no key.
pub fn whitelist_request(
    deployments_dir: &Path,
    contract: &str,
    resolver: &str,
    status: bool,
    signer: &Signer,
    now: Timestamp,
) -> Result<PreparedRequest, AdminError> {
    let deployment = deployments::require(deployments_dir, contract)?;
    let resolver = parse_address("resolver", resolver)?;
    if !signer.signs() {
        return Err(AdminError::MissingKey("SetWhiteList"));
    }
    let message = SwapMessage::SetWhiteList(SetWhiteListPayload {
        resolver,
        whitelist_status: status,
    });
    Ok(PreparedRequest {
        contract: deployment.address,
        chain_id: ChainId(deployment.chain_id),
        request: signer.seal(now, message)?,
    })
}

/// Parse an address argument.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, AdminError> {
    Address::new(value).map_err(|e| AdminError::InvalidArgument {
        field,
        reason: e.to_string(),
    })
}

fn parse_hash(value: &str) -> Result<Hash, AdminError> {
    parse_hash_hex(value).map_err(|e| AdminError::InvalidArgument {
        field: "hash",
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_runtime::handlers::parse_envelope;
    use std::fs;
    use sw_01_escrow::verify_bytes;
    use tempfile::TempDir;

    const NOW: u64 = 1_700_000_000;
    const HASH: &str = "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925";

    fn deployments() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("escrow.json"),
            r#"{ "name": "escrow", "address": "EQescrow", "chainId": -3 }"#,
        )
        .unwrap();
        dir
    }

    const KEY: &[u8] = b"EQadmin-shared-key-0001";

    fn admin() -> Address {
        Address::new("EQadmin").unwrap()
    }

    fn signer() -> Signer {
        Signer::with_key(admin(), KEY.to_vec()).unwrap()
    }

    #[test]
    fn test_secret_bundle_is_consistent() {
        let bundle = secret_bundle(&signer(), NOW).unwrap();
        let secret = hex::decode(&bundle.secret).unwrap();
        let hash = hex::decode(&bundle.hash).unwrap();
        assert!(verify_bytes(&secret, &hash));

        let SwapMessage::Lock(lock) = &bundle.lock.payload else {
            panic!("expected Lock");
        };
        assert_eq!(lock.hash, bundle.hash);
        assert_eq!(lock.timelock, NOW + EXAMPLE_TIMELOCK_SECS);
        assert_eq!(lock.amount, EXAMPLE_AMOUNT);

        let rendered = bundle.render().unwrap();
        assert!(rendered.contains(&bundle.secret));
        assert!(rendered.contains("\"op\": \"Create\""));
    }

    #[test]
    fn test_examples_parse_as_requests() {
        let bundle = secret_bundle(&signer(), NOW).unwrap();
        for envelope in [&bundle.lock, &bundle.create, &bundle.refund] {
            let raw = serde_json::to_string(envelope).unwrap();
            let parsed = parse_envelope(&raw).unwrap();
            assert_eq!(&parsed, envelope);
            assert!(parsed.verify_signature(KEY).is_ok());
        }
    }

    #[test]
    fn test_unsigned_bundle_has_no_signature() {
        let bundle = secret_bundle(&Signer::unsigned(admin()), NOW).unwrap();
        assert!(!bundle.lock.is_signed());
        assert!(!bundle.render().unwrap().contains("signature"));
    }

    #[test]
    fn test_whitelist_requires_key() {
        let dir = deployments();
        let err = whitelist_request(
            dir.path(),
            "EQescrow",
            "EQresolver",
            true,
            &Signer::unsigned(admin()),
            NOW,
        )
        .unwrap_err();
        assert!(matches!(err, AdminError::MissingKey("SetWhiteList")));
    }

    #[test]
    fn test_short_or_malformed_key_rejected() {
        assert!(matches!(
            Signer::with_key(admin(), vec![1, 2, 3]),
            Err(AdminError::Signing(SecurityError::InvalidKey(_)))
        ));
        assert!(matches!(
            parse_key("xyz"),
            Err(AdminError::InvalidArgument { field: "key", .. })
        ));
        assert_eq!(parse_key(&format!("0x{}", hex::encode(KEY))).unwrap(), KEY);
        assert!(!format!("{:?}", signer()).contains("shared-key"));
    }

    #[test]
    fn test_refund_order_request() {
        let dir = deployments();
        let prepared =
            refund_request(dir.path(), "EQescrow", "order", HASH, &signer(), NOW).unwrap();
        assert_eq!(prepared.chain_id, ChainId::TON_MAINNET);
        assert!(matches!(prepared.request.payload, SwapMessage::RefundOrder(_)));
        assert!(prepared.to_json().unwrap().contains("RefundOrder"));
    }

    #[test]
    fn test_refund_undeployed_contract_fails_first() {
        let dir = deployments();
        // Bad kind and bad hash too: the contract is reported.
        let err = refund_request(dir.path(), "EQmissing", "vault", "zz", &signer(), NOW)
            .unwrap_err();
        assert!(matches!(err, AdminError::ContractNotDeployed { .. }));
    }

    #[test]
    fn test_refund_invalid_kind() {
        let dir = deployments();
        let err = refund_request(dir.path(), "EQescrow", "Escrow", HASH, &signer(), NOW)
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidRefundKind(ref k) if k == "Escrow"));
    }

    #[test]
    fn test_refund_invalid_hash() {
        let dir = deployments();
        let err =
            refund_request(dir.path(), "EQescrow", "escrow", "0x12", &signer(), NOW).unwrap_err();
        assert!(matches!(err, AdminError::InvalidArgument { field: "hash", .. }));
    }

    #[test]
    fn test_whitelist_request() {
        let dir = deployments();
        let prepared =
            whitelist_request(dir.path(), "EQescrow", "EQresolver", false, &signer(), NOW)
                .unwrap();
        let SwapMessage::SetWhiteList(update) = &prepared.request.payload else {
            panic!("expected SetWhiteList");
        };
        assert_eq!(update.resolver.as_str(), "EQresolver");
        assert!(!update.whitelist_status);
        assert_eq!(prepared.request.sender, admin());
        assert!(prepared.request.verify_signature(KEY).is_ok());
    }

    #[test]
    fn test_whitelist_blank_resolver_rejected() {
        let dir = deployments();
        let err = whitelist_request(dir.path(), "EQescrow", "  ", true, &signer(), NOW)
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidArgument { field: "resolver", .. }));
    }
}
