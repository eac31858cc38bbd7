//! # Adapters
//!
//! Node-level glue around the subsystems: the replay guard at the request
//! boundary and the bridge from the notifier bus to Prometheus.

pub mod metrics_bridge;
pub mod replay_cache;

pub use replay_cache::{ReplayError, ReplayGuard};
