//! # Adapters Module
//!
//! Chain backends: Esplora over HTTP, and a scripted mock.

pub mod esplora;
pub mod mock;

pub use esplora::EsploraBackend;
pub use mock::MockChainBackend;
