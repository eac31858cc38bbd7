//! # Domain Invariants
//!
//! Preconditions checked by the ledgers before any mutation. Each returns the
//! first violated rule, in the order callers observe them.

use super::entities::{CreateParams, SwapRecord};
use super::errors::EscrowError;
use super::registry::ResolverRegistry;
use crate::algorithms::secret;
use shared_types::Address;
use shared_types::{EscrowStatus, Secret, Timestamp};

/// Invariant: a new record locks a positive amount until a future time.
pub fn invariant_valid_creation(
    params: &CreateParams,
    now: Timestamp,
    same_chain: bool,
) -> Result<(), EscrowError> {
    if params.amount == 0 {
        return Err(EscrowError::InvalidAmount);
    }
    if params.timelock <= now {
        return Err(EscrowError::InvalidTimelock {
            timelock: params.timelock,
            now,
        });
    }
    if same_chain && params.source_chain != params.destination_chain {
        return Err(EscrowError::InvalidChainPair {
            source_chain: params.source_chain,
            destination_chain: params.destination_chain,
        });
    }
    Ok(())
}

/// Invariant: funding only while the record awaits its counter-leg.
pub fn invariant_awaiting_funds(record: &SwapRecord) -> Result<(), EscrowError> {
    if record.status.is_unfunded() {
        Ok(())
    } else {
        Err(EscrowError::AlreadyFunded(record.status))
    }
}

/// Invariant: a funding transaction may only lock a record nobody has
/// locked or funded yet.
pub fn invariant_lockable(record: &SwapRecord) -> Result<(), EscrowError> {
    match (record.status, &record.funding_tx) {
        (EscrowStatus::Created, _) | (EscrowStatus::Locked, None) => Ok(()),
        (EscrowStatus::Locked, Some(existing)) => Err(EscrowError::AlreadyLocked(existing.clone())),
        (EscrowStatus::Funded, _) => Err(EscrowError::AlreadyFunded(record.status)),
        (EscrowStatus::Claimed | EscrowStatus::Refunded, _) => {
            Err(EscrowError::AlreadyFinalized(record.status))
        }
    }
}

/// Invariant: the funder is whitelisted, is the resolver named at creation
/// (if any), and is the funder holding the lock (if locked).
pub fn invariant_funder_allowed(
    record: &SwapRecord,
    funder: &Address,
    registry: &ResolverRegistry,
) -> Result<(), EscrowError> {
    if !registry.is_whitelisted(funder) {
        return Err(EscrowError::ResolverNotWhitelisted(funder.clone()));
    }
    if let Some(named) = &record.resolver {
        if named != funder {
            return Err(EscrowError::Unauthorized(funder.clone()));
        }
    }
    if let (EscrowStatus::Locked, Some(locker), Some(existing)) =
        (record.status, &record.funder, &record.funding_tx)
    {
        if locker != funder {
            return Err(EscrowError::AlreadyLocked(existing.clone()));
        }
    }
    Ok(())
}

/// Invariant: claim requires the preimage, then a funded, open record.
///
/// The secret is checked first, so a wrong secret is reported as such
/// whatever the record's status.
pub fn invariant_claimable(record: &SwapRecord, secret: &Secret) -> Result<(), EscrowError> {
    if !secret::verify(secret, &record.hashlock) {
        return Err(EscrowError::InvalidSecret);
    }
    if record.status.is_terminal() {
        return Err(EscrowError::AlreadyFinalized(record.status));
    }
    if record.status != EscrowStatus::Funded {
        return Err(EscrowError::NotFunded(record.status));
    }
    Ok(())
}

/// Invariant: refund only after expiry, and only once.
pub fn invariant_refundable(record: &SwapRecord, now: Timestamp) -> Result<(), EscrowError> {
    if !record.is_expired(now) {
        return Err(EscrowError::TimelockNotExpired {
            timelock: record.timelock,
            now,
        });
    }
    if record.status.is_terminal() {
        return Err(EscrowError::AlreadyFinalized(record.status));
    }
    Ok(())
}
