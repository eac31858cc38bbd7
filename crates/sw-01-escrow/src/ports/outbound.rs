//! # Outbound Ports
//!
//! Dependencies the escrow core needs from its host. The clock lives in
//! `shared-types` so the relayer reads the same time.

pub use shared_types::time::{ManualTimeSource, SystemTimeSource, TimeSource};
