//! # Handlers
//!
//! Inbound request handling and the background tasks that keep the ledgers
//! in step with the chain.

pub mod coordinator;
pub mod funding_watcher;
pub mod messages;
pub mod refund_sweeper;

pub use coordinator::{CoordinatorError, ErrorBody, Outcome, RequestCoordinator, SwapResponse};
pub use funding_watcher::{FundingWatcher, WatcherError};
pub use messages::{parse_envelope, MessageError, SwapMessage};
pub use refund_sweeper::{RefundSweeper, SweepSummary};
