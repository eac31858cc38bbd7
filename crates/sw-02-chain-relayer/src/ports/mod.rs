//! # Ports Module
//!
//! Outbound port to the chain being relayed to.

pub mod outbound;

pub use outbound::*;
