//! # Integration Tests
//!
//! Every scenario runs against real subsystem instances; only the clock and
//! the chain backend are substituted.

pub mod fixtures;

mod notifier;
mod relayer_funding;
mod swap_lifecycle;
