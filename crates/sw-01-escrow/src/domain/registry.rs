//! # Resolver Registry
//!
//! Whitelist of resolvers allowed to fund counter-legs. Only the
//! administrator identity may change it. Entries are upserted, never deleted,
//! so the listing doubles as an audit trail of every resolver ever seen.

use super::errors::EscrowError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::BTreeMap;
use tracing::info;

/// One registry entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolver {
    /// Resolver identity.
    pub address: Address,
    /// Whether the resolver may fund.
    pub whitelisted: bool,
}

/// Administrator-controlled resolver whitelist.
pub struct ResolverRegistry {
    admin: Address,
    entries: RwLock<BTreeMap<Address, bool>>,
}

impl ResolverRegistry {
    /// Create an empty registry owned by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// The administrator identity.
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Set a resolver's whitelist flag. Idempotent.
    ///
    /// Returns `true` if the flag changed.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the administrator.
    pub fn set_whitelist(
        &self,
        caller: &Address,
        resolver: Address,
        enabled: bool,
    ) -> Result<bool, EscrowError> {
        if caller != &self.admin {
            return Err(EscrowError::Unauthorized(caller.clone()));
        }

        let previous = self.entries.write().insert(resolver.clone(), enabled);
        let changed = previous != Some(enabled);
        if changed {
            info!(resolver = %resolver, whitelisted = enabled, "Resolver whitelist updated");
        }
        Ok(changed)
    }

    /// Whether a resolver may fund. Unknown resolvers are not whitelisted.
    pub fn is_whitelisted(&self, resolver: &Address) -> bool {
        self.entries.read().get(resolver).copied().unwrap_or(false)
    }

    /// Snapshot of every known resolver, sorted by address.
    pub fn resolvers(&self) -> Vec<Resolver> {
        self.entries
            .read()
            .iter()
            .map(|(address, whitelisted)| Resolver {
                address: address.clone(),
                whitelisted: *whitelisted,
            })
            .collect()
    }
}
