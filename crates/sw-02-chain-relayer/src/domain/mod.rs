//! # Domain Module
//!
//! Chain transactions, the mempool view, relayer configuration and errors.

pub mod config;
pub mod entities;
pub mod errors;
pub mod mempool;

pub use config::RelayerConfig;
pub use entities::*;
pub use errors::*;
pub use mempool::MempoolView;
