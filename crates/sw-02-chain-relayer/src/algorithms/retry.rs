//! Retry policy for transaction submission.
//!
//! Bounded exponential backoff: attempt `n` (0-indexed) waits
//! `initial * multiplier^n`, capped at `max_backoff`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Submission retry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for any single wait.
    pub max_backoff: Duration,
    /// Growth factor between waits.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Calculate backoff duration for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_backoff
        }
    }

    /// Whether another attempt is allowed after `attempts_made` failures.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Classifies backend error text for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Temporary failure (timeouts, overloaded node). Retry.
    Transient,
    /// The transaction itself is bad. Never retry.
    Permanent,
    /// Unrecognised. Callers decide from context.
    Unknown,
}

/// Classify a backend error message.
pub fn classify_error(error: &str) -> ErrorClass {
    let error_lower = error.to_lowercase();

    if error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("rate limit")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
        || error_lower.contains("temporarily unavailable")
    {
        return ErrorClass::Transient;
    }

    if error_lower.contains("bad-txns")
        || error_lower.contains("missingorspent")
        || error_lower.contains("min relay fee not met")
        || error_lower.contains("insufficient fee")
        || error_lower.contains("non-mandatory-script-verify-flag")
        || error_lower.contains("mandatory-script-verify-flag-failed")
        || error_lower.contains("txn-mempool-conflict")
        || error_lower.contains("dust")
        || error_lower.contains("tx decode failed")
    {
        return ErrorClass::Permanent;
    }

    ErrorClass::Unknown
}
