//! # SW-02 Chain Relayer
//!
//! Submits funding and settlement transactions to external chains and tracks
//! them until they reach the required depth.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Responsibilities
//!
//! - Broadcast raw transactions, retrying transient failures with bounded
//!   exponential backoff
//! - Report confirmation status against a configurable minimum depth
//! - Keep a local mempool view so funding can be correlated with a record
//!   before it is confirmed
//! - Run one cancellable polling task per watched transaction
//!
//! ## Module Structure
//!
//! ```text
//! sw-02-chain-relayer/
//! ├── domain/          # ChainTransaction, MempoolView, RelayerConfig, errors
//! ├── algorithms/      # RetryPolicy, error classification
//! ├── ports/           # ChainBackend
//! ├── adapters/        # EsploraBackend, MockChainBackend
//! ├── poller.rs        # PollHandle
//! └── service.rs       # ChainRelayer
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod poller;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{EsploraBackend, MockChainBackend};
pub use algorithms::{classify_error, ErrorClass, RetryPolicy};
pub use domain::{
    BackendError, ChainTransaction, ConfirmationUpdate, MempoolView, OutgoingTransaction,
    RecordRef, RelayerConfig, RelayerError, TxId, TxStatus,
};
pub use poller::PollHandle;
pub use ports::{BackendTxStatus, ChainBackend};
pub use service::ChainRelayer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
