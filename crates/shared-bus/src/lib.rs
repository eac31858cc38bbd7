//! # Shared Bus - Order Status Notifier
//!
//! Carries every successful ledger transition, plus relayer observations,
//! to whoever subscribed.
//!
//! ## Streams
//!
//! Each `(LedgerKind, hashlock)` pair is a logical stream. A subscriber
//! filtered to one record sees that record's transitions in the order the
//! ledger applied them.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Escrow/Order │                    │   Watcher,   │
//! │   Ledgers    │    publish()       │  WS bridge   │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - **No replay:** subscribers only see events published after subscribing.
//! - **Bounded:** lagging subscribers skip events rather than grow memory.
//! - **Dead Letter Queue:** critical errors go to the `DeadLetterQueue` topic.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;
pub mod wire;

// Re-export main types
pub use events::{EventFilter, EventTopic, StatusTransition, SwapEvent};
pub use publisher::{EventPublisher, InMemoryEventBus, NullPublisher};
pub use subscriber::{EventStream, Subscription, SubscriptionError};
pub use wire::{BusError, OrderUpdate, StatusMessage};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
        assert_eq!(InMemoryEventBus::new().capacity(), DEFAULT_CHANNEL_CAPACITY);
    }
}
