//! # Hashlock-Swap Test Suite
//!
//! Cross-subsystem tests that drive the escrow core, the chain relayer and
//! the notifier together the way the node wires them.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── escrow_benchmarks.rs   # Commit/verify and ledger throughput
//! └── src/integration/
//!     ├── fixtures.rs            # Shared clocks, addresses, builders
//!     ├── swap_lifecycle.rs      # Create → fund → claim / refund, races
//!     ├── relayer_funding.rs     # Broadcast → confirm → Funded via the node
//!     └── notifier.rs            # Per-record ordering, wire messages
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p swap-tests
//!
//! # By category
//! cargo test -p swap-tests integration::swap_lifecycle::
//! cargo test -p swap-tests integration::relayer_funding::
//!
//! # Benchmarks
//! cargo bench -p swap-tests
//! ```

pub mod integration;
