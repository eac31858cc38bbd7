//! Scripted chain backend for tests and simulations.

use crate::domain::{BackendError, TxId};
use crate::ports::{BackendTxStatus, ChainBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::ChainId;
use std::collections::{HashMap, VecDeque};

// =============================================================================
// MOCK CHAIN BACKEND (for testing)
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    submit_failures: VecDeque<BackendError>,
    status_failures: VecDeque<BackendError>,
    statuses: HashMap<TxId, BackendTxStatus>,
    tip: u64,
    submit_attempts: u32,
    status_polls: u32,
}

/// In-memory backend whose answers are set by the test.
///
/// Accepted transactions get the hex of their raw bytes as id, so tests can
/// predict ids.
#[derive(Debug)]
pub struct MockChainBackend {
    chain: ChainId,
    state: Mutex<MockState>,
}

impl MockChainBackend {
    /// Create a mock for `chain` with the tip at height 0.
    pub fn new(chain: ChainId) -> Self {
        Self {
            chain,
            state: Mutex::new(MockState::default()),
        }
    }

    /// The id the mock assigns to `raw`.
    pub fn id_for(raw: &[u8]) -> TxId {
        TxId::new(hex::encode(raw))
    }

    /// Make the next submission fail with `error`. Calls queue up.
    pub fn fail_next_submit(&self, error: BackendError) {
        self.state.lock().submit_failures.push_back(error);
    }

    /// Make the next status query fail with `error`. Calls queue up.
    pub fn fail_next_status(&self, error: BackendError) {
        self.state.lock().status_failures.push_back(error);
    }

    /// Set the best block height.
    pub fn set_tip(&self, height: u64) {
        self.state.lock().tip = height;
    }

    /// Advance the tip by `blocks`.
    pub fn mine(&self, blocks: u64) {
        self.state.lock().tip += blocks;
    }

    /// Include `id` at `height`.
    pub fn confirm(&self, id: &TxId, height: u64) {
        self.state
            .lock()
            .statuses
            .insert(id.clone(), BackendTxStatus::in_block(height));
    }

    /// Forget `id`, as if it was evicted from the node's mempool.
    pub fn drop_tx(&self, id: &TxId) {
        self.state.lock().statuses.remove(id);
    }

    /// Submissions attempted, successful or not.
    pub fn submit_attempts(&self) -> u32 {
        self.state.lock().submit_attempts
    }

    /// Status queries answered, successful or not.
    pub fn status_polls(&self) -> u32 {
        self.state.lock().status_polls
    }
}

#[async_trait]
impl ChainBackend for MockChainBackend {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn submit(&self, raw: &[u8]) -> Result<TxId, BackendError> {
        let mut state = self.state.lock();
        state.submit_attempts += 1;
        if let Some(error) = state.submit_failures.pop_front() {
            return Err(error);
        }
        let id = Self::id_for(raw);
        state
            .statuses
            .entry(id.clone())
            .or_insert_with(BackendTxStatus::unconfirmed);
        Ok(id)
    }

    async fn tx_status(&self, id: &TxId) -> Result<BackendTxStatus, BackendError> {
        let mut state = self.state.lock();
        state.status_polls += 1;
        if let Some(error) = state.status_failures.pop_front() {
            return Err(error);
        }
        state.statuses.get(id).copied().ok_or(BackendError::NotFound)
    }

    async fn tip_height(&self) -> Result<u64, BackendError> {
        Ok(self.state.lock().tip)
    }
}
