//! # Relayer Errors
//!
//! `BackendError` is what a chain backend reports for a single call.
//! `RelayerError` is what the relayer reports after retries.

use super::entities::TxId;
use thiserror::Error;

/// Failure of one backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Network trouble or an overloaded node. Worth retrying.
    #[error("Transient backend error: {0}")]
    Transient(String),

    /// The node refused the request. Retrying the same bytes will not help.
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// The node does not know this transaction.
    #[error("Transaction not found")]
    NotFound,

    /// The node answered with something we could not parse.
    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// Relayer error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayerError {
    /// Submission failed permanently or ran out of attempts.
    #[error("Broadcast failed after {attempts} attempt(s): {reason}")]
    BroadcastFailed {
        /// Attempts made, including the last one
        attempts: u32,
        /// Last backend error
        reason: String,
    },

    /// Status query failed.
    #[error("Status query for {id} failed: {source}")]
    Status {
        /// Transaction queried
        id: TxId,
        /// Backend failure
        #[source]
        source: BackendError,
    },
}

impl RelayerError {
    /// Whether a later status poll may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RelayerError::BroadcastFailed { .. } => false,
            RelayerError::Status { source, .. } => source.is_transient(),
        }
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RelayerError::BroadcastFailed { .. } => "broadcast_failed",
            RelayerError::Status { .. } => "status_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_transient_classification() {
        assert!(BackendError::Transient("timeout".into()).is_transient());
        assert!(!BackendError::Rejected("bad-txns".into()).is_transient());
        assert!(!BackendError::NotFound.is_transient());
        assert!(!BackendError::Malformed("{".into()).is_transient());
    }

    #[test]
    fn test_broadcast_failed_message() {
        let err = RelayerError::BroadcastFailed {
            attempts: 3,
            reason: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "Broadcast failed after 3 attempt(s): connection refused"
        );
        assert!(!err.is_transient());
        assert_eq!(err.code(), "broadcast_failed");
    }

    #[test]
    fn test_status_error_inherits_transience() {
        let err = RelayerError::Status {
            id: TxId::new("ff"),
            source: BackendError::Transient("503".into()),
        };
        assert!(err.is_transient());
    }
}
