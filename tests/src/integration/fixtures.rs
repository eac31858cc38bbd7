//! Shared builders for the integration scenarios and benchmarks.

use node_runtime::SwapMessage;
use serde_json::{json, Value};
use shared_bus::InMemoryEventBus;
use shared_types::{
    Address, ChainId, Envelope, Hash, LedgerKind, ManualTimeSource, SenderKeys, Timestamp,
};
use std::sync::Arc;
use sw_01_escrow::{generate_pair, CreateParams, EscrowApi, EscrowService, SecureSecret};
use uuid::Uuid;

/// Fixed start time for every scenario.
pub const NOW: Timestamp = 1_700_000_000;

/// Amount locked by the standard records.
pub const AMOUNT: u128 = 1_000_000;

/// Registry admin.
pub const ADMIN: &str = "EQadmin";

/// Maker of the standard records.
pub const MAKER: &str = "EQmaker";

/// Whitelisted resolver.
pub const RESOLVER: &str = "0xresolver";

/// Senders sharing a key with the node.
pub const KEYED_SENDERS: [&str; 3] = [ADMIN, MAKER, RESOLVER];

/// Shared key of a fixture sender.
pub fn shared_key(sender: &str) -> Vec<u8> {
    format!("{sender}-shared-key-0001").into_bytes()
}

/// Keys for every sender in `KEYED_SENDERS`.
pub fn sender_keys() -> SenderKeys {
    let mut keys = SenderKeys::new();
    for sender in KEYED_SENDERS {
        keys.insert(addr(sender), shared_key(sender))
            .expect("fixture key");
    }
    keys
}

/// Address from a literal.
pub fn addr(value: &str) -> Address {
    Address::new(value).expect("fixture address")
}

/// Escrow service on a manual clock, publishing to a real bus.
pub struct SwapHarness {
    /// Manual clock shared with the service.
    pub clock: Arc<ManualTimeSource>,
    /// Notifier bus.
    pub bus: Arc<InMemoryEventBus>,
    /// Service under test.
    pub escrow: Arc<EscrowService>,
}

impl SwapHarness {
    /// Empty ledgers at `NOW` with `RESOLVER` whitelisted.
    pub fn new() -> Self {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let bus = Arc::new(InMemoryEventBus::new());
        let escrow = Arc::new(EscrowService::new(addr(ADMIN), bus.clone(), clock.clone()));
        escrow
            .set_whitelist(&addr(ADMIN), addr(RESOLVER), true)
            .expect("admin may whitelist");
        Self { clock, bus, escrow }
    }

    /// Cross-chain TON → Ethereum escrow locking `AMOUNT` until `timelock`.
    pub fn open_escrow(&self, timelock: Timestamp) -> (SecureSecret, Hash) {
        let (secret, hashlock) = generate_pair();
        let mut params =
            CreateParams::order(hashlock, addr(MAKER), ChainId::TON_MAINNET, "TON", AMOUNT, timelock);
        params.destination_chain = ChainId::ETHEREUM;
        params.receiver = Some(addr("0xreceiver"));
        self.escrow
            .create(LedgerKind::Escrow, params)
            .expect("valid escrow");
        (secret, hashlock)
    }

    /// Same-chain BSC order locking `AMOUNT` until `timelock`.
    pub fn open_order(&self, timelock: Timestamp) -> (SecureSecret, Hash) {
        let (secret, hashlock) = generate_pair();
        let params = CreateParams::order(hashlock, addr(MAKER), ChainId::BSC, "BNB", AMOUNT, timelock);
        self.escrow
            .create(LedgerKind::Order, params)
            .expect("valid order");
        (secret, hashlock)
    }
}

impl Default for SwapHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw request line as a client would send it, signed when the sender is
/// one of `KEYED_SENDERS`.
pub fn request_line(sender: &str, timestamp: Timestamp, message: Value) -> String {
    let raw = json!({
        "version": 1,
        "sender": sender,
        "correlation_id": Uuid::new_v4(),
        "timestamp": timestamp,
        "payload": message,
    })
    .to_string();
    if !KEYED_SENDERS.contains(&sender) {
        return raw;
    }
    let envelope: Envelope<SwapMessage> = serde_json::from_str(&raw).expect("fixture request");
    let signed = envelope
        .signed(&shared_key(sender))
        .expect("fixture signature");
    serde_json::to_string(&signed).expect("fixture encoding")
}
