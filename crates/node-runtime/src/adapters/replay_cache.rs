//! # Replay Guard
//!
//! Rejects stale envelopes and replayed correlation ids at the coordinator
//! boundary.
//!
//! - Timestamps are checked first: `now - max_age <= ts <= now + max_future_skew`.
//! - A correlation id is accepted once. It is forgotten only when an envelope
//!   carrying its timestamp would fail the age check anyway.
//! - Expired ids are garbage-collected at most every `GC_INTERVAL_SECS`.

use crate::container::CoordinatorConfig;
use parking_lot::Mutex;
use shared_types::{TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Replay check failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// Correlation id already seen inside the window.
    #[error("Correlation id {correlation_id} has already been used")]
    Reused {
        /// Replayed id.
        correlation_id: Uuid,
    },

    /// Envelope timestamp older than the accepted window.
    #[error("Message timestamp {timestamp} is too old (threshold: {threshold})")]
    TooOld {
        /// Envelope timestamp.
        timestamp: Timestamp,
        /// Oldest accepted timestamp.
        threshold: Timestamp,
    },

    /// Envelope timestamp too far in the future.
    #[error("Message timestamp {timestamp} is in the future (threshold: {threshold})")]
    FromFuture {
        /// Envelope timestamp.
        timestamp: Timestamp,
        /// Newest accepted timestamp.
        threshold: Timestamp,
    },
}

impl ReplayError {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ReplayError::Reused { .. } => "replayed",
            ReplayError::TooOld { .. } => "stale_message",
            ReplayError::FromFuture { .. } => "future_message",
        }
    }
}

struct Seen {
    ids: HashMap<Uuid, Timestamp>,
    last_gc: Timestamp,
}

/// Time-bounded correlation-id cache.
pub struct ReplayGuard {
    seen: Mutex<Seen>,
    max_age_secs: u64,
    max_future_skew_secs: u64,
    clock: Arc<dyn TimeSource>,
}

impl ReplayGuard {
    /// Minimum spacing between garbage collections.
    pub const GC_INTERVAL_SECS: u64 = 10;

    /// Create a guard reading time from `clock`.
    pub fn new(config: &CoordinatorConfig, clock: Arc<dyn TimeSource>) -> Self {
        let now = clock.now();
        Self {
            seen: Mutex::new(Seen {
                ids: HashMap::new(),
                last_gc: now,
            }),
            max_age_secs: config.max_message_age_secs,
            max_future_skew_secs: config.max_future_skew_secs,
            clock,
        }
    }

    /// Validate the timestamp, then record the id.
    ///
    /// # Errors
    ///
    /// `TooOld` / `FromFuture` outside the window, `Reused` for an id
    /// already accepted. Rejected envelopes leave the cache untouched.
    pub fn check(&self, correlation_id: Uuid, timestamp: Timestamp) -> Result<(), ReplayError> {
        let now = self.clock.now();
        let oldest = now.saturating_sub(self.max_age_secs);
        let newest = now.saturating_add(self.max_future_skew_secs);

        if timestamp < oldest {
            return Err(ReplayError::TooOld {
                timestamp,
                threshold: oldest,
            });
        }
        if timestamp > newest {
            return Err(ReplayError::FromFuture {
                timestamp,
                threshold: newest,
            });
        }

        let mut seen = self.seen.lock();
        if now.saturating_sub(seen.last_gc) >= Self::GC_INTERVAL_SECS {
            seen.ids.retain(|_, ts| *ts >= oldest);
            seen.last_gc = now;
        }

        if seen.ids.contains_key(&correlation_id) {
            return Err(ReplayError::Reused { correlation_id });
        }
        seen.ids.insert(correlation_id, timestamp);
        Ok(())
    }

    /// Ids currently remembered.
    pub fn len(&self) -> usize {
        self.seen.lock().ids.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ManualTimeSource;

    fn guard(now: u64) -> (ReplayGuard, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(now));
        let config = CoordinatorConfig {
            max_message_age_secs: 60,
            max_future_skew_secs: 10,
            sender_keys: shared_types::SenderKeys::new(),
        };
        (ReplayGuard::new(&config, clock.clone()), clock)
    }

    #[test]
    fn test_fresh_id_accepted_once() {
        let (guard, _) = guard(1_000);
        let id = Uuid::new_v4();
        assert!(guard.check(id, 1_000).is_ok());
        assert_eq!(
            guard.check(id, 1_000),
            Err(ReplayError::Reused { correlation_id: id })
        );
    }

    #[test]
    fn test_window_edges() {
        let (guard, _) = guard(1_000);
        assert!(guard.check(Uuid::new_v4(), 940).is_ok());
        assert!(guard.check(Uuid::new_v4(), 1_010).is_ok());
        assert_eq!(
            guard.check(Uuid::new_v4(), 939),
            Err(ReplayError::TooOld {
                timestamp: 939,
                threshold: 940
            })
        );
        assert_eq!(
            guard.check(Uuid::new_v4(), 1_011),
            Err(ReplayError::FromFuture {
                timestamp: 1_011,
                threshold: 1_010
            })
        );
    }

    #[test]
    fn test_timestamp_checked_before_id() {
        let (guard, clock) = guard(1_000);
        let id = Uuid::new_v4();
        guard.check(id, 1_000).unwrap();
        clock.advance(120);
        // Stale replay is reported as stale, not as reuse.
        assert!(matches!(
            guard.check(id, 1_000),
            Err(ReplayError::TooOld { .. })
        ));
    }

    #[test]
    fn test_rejected_envelope_not_remembered() {
        let (guard, _) = guard(1_000);
        let id = Uuid::new_v4();
        assert!(guard.check(id, 5_000).is_err());
        assert!(guard.is_empty());
        assert!(guard.check(id, 1_000).is_ok());
    }

    #[test]
    fn test_expired_ids_collected() {
        let (guard, clock) = guard(1_000);
        for _ in 0..5 {
            guard.check(Uuid::new_v4(), 1_000).unwrap();
        }
        assert_eq!(guard.len(), 5);

        clock.advance(61);
        guard.check(Uuid::new_v4(), 1_061).unwrap();
        assert_eq!(guard.len(), 1);
    }
}
