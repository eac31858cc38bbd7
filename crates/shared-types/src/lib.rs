//! # Shared Types Crate
//!
//! This crate contains the swap vocabulary shared by every subsystem and the
//! `Envelope<T>` wrapper used for inbound requests.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Envelope Identity**: Payloads never carry a caller field; the
//!   envelope's `sender` is authoritative once its HMAC signature checks out.
//! - **Chain Agnostic**: Identities are opaque strings so TON, EVM and
//!   Bitcoin addresses share one type.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod security;
pub mod status;
pub mod time;

pub use entities::*;
pub use envelope::Envelope;
pub use errors::*;
pub use security::{SecurityError, SenderKeys};
pub use status::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
