//! # Node Runtime Library
//!
//! The swap coordinator node: configuration, the request coordinator, and
//! the background tasks that connect the chain relayer to the ledgers.
//! The `node-runtime` binary is a thin shell around `NodeRuntime`.
//!
//! ## Module Structure
//!
//! - `container/` - configuration and subsystem wiring
//! - `adapters/` - replay guard, bus-to-metrics bridge
//! - `handlers/` - message vocabulary, coordinator, funding watcher, refund sweeper
//! - `runtime` - task lifecycle

#![warn(missing_docs)]
#![allow(clippy::too_many_lines)]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, SwapContainer};
pub use handlers::{RequestCoordinator, SwapMessage, SwapResponse};
pub use runtime::NodeRuntime;
