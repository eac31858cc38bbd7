//! # SW-Admin
//!
//! Operator tools for the swap coordinator. Every command validates its
//! inputs locally and prints a ready-to-submit request envelope; nothing is
//! sent anywhere. With `--key` every envelope is signed with the sender's
//! shared key.
//!
//! | Command | Checks before producing a request |
//! |---------|-----------------------------------|
//! | `secret` | none |
//! | `refund` | contract is deployed, kind is `escrow` or `order`, hash is 32 bytes |
//! | `whitelist` | contract is deployed, resolver address is valid, a key is given |

pub mod deployments;
pub mod requests;

use shared_types::SecurityError;
use std::path::PathBuf;
use thiserror::Error;

/// Admin tool errors. Messages are shown to operators as-is.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No deployment record for the contract.
    #[error("Contract {contract} is not deployed (no record in {})", .dir.display())]
    ContractNotDeployed {
        /// Contract address given.
        contract: String,
        /// Directory searched.
        dir: PathBuf,
    },

    /// Deployment directory could not be listed.
    #[error("Cannot read deployment directory {}: {source}", .dir.display())]
    DeploymentsUnreadable {
        /// Directory.
        dir: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Refund kind other than `escrow` / `order`.
    #[error("Invalid refund kind {0:?}: expected \"escrow\" or \"order\"")]
    InvalidRefundKind(String),

    /// Bad field value.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument {
        /// Argument name.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// The request is refused by the node unless signed.
    #[error("{0} requests must be signed; pass --key or set SWAP_SENDER_KEY")]
    MissingKey(&'static str),

    /// Key unusable or signing failed.
    #[error("Signing failed: {0}")]
    Signing(#[from] SecurityError),

    /// Output encoding failed.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}
