//! Relayer configuration.

use crate::algorithms::RetryPolicy;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::time::Duration;

/// Relayer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayerConfig {
    /// Chain the backend talks to.
    pub chain: ChainId,
    /// Depth at which a transaction counts as confirmed.
    pub min_confirmations: u64,
    /// Interval between status polls of a watched transaction.
    pub poll_interval: Duration,
    /// How long entries stay in the mempool view, in seconds.
    pub retention_secs: u64,
    /// Submission retries.
    pub retry: RetryPolicy,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            chain: ChainId::BITCOIN,
            min_confirmations: ChainId::BITCOIN.required_confirmations(),
            poll_interval: Duration::from_secs(30),
            retention_secs: 24 * 60 * 60,
            retry: RetryPolicy::default(),
        }
    }
}

impl RelayerConfig {
    /// Defaults for `chain`, using its usual finality depth.
    pub fn for_chain(chain: ChainId) -> Self {
        Self {
            chain,
            min_confirmations: chain.required_confirmations(),
            ..Self::default()
        }
    }
}
