//! # Outbound Ports
//!
//! What the relayer needs from a chain node.

use crate::domain::{BackendError, TxId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;

/// Inclusion status as reported by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendTxStatus {
    /// Included in a block.
    pub confirmed: bool,
    /// Height of the including block.
    #[serde(default)]
    pub block_height: Option<u64>,
}

impl BackendTxStatus {
    /// Seen by the node but not yet in a block.
    pub fn unconfirmed() -> Self {
        Self::default()
    }

    /// Included at `height`.
    pub fn in_block(height: u64) -> Self {
        Self {
            confirmed: true,
            block_height: Some(height),
        }
    }

    /// Depth given the current tip. The including block counts as one.
    pub fn confirmations(&self, tip_height: u64) -> u64 {
        match (self.confirmed, self.block_height) {
            (true, Some(height)) if tip_height >= height => tip_height - height + 1,
            _ => 0,
        }
    }
}

/// Chain node access.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Chain this backend talks to.
    fn chain(&self) -> ChainId;

    /// Submit a signed transaction. Returns the id the node assigned.
    async fn submit(&self, raw: &[u8]) -> Result<TxId, BackendError>;

    /// Inclusion status of a transaction.
    async fn tx_status(&self, id: &TxId) -> Result<BackendTxStatus, BackendError>;

    /// Height of the best block.
    async fn tip_height(&self) -> Result<u64, BackendError>;
}
