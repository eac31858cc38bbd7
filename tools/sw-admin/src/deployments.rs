//! Deployment directory lookup.
//!
//! A deployment directory holds one JSON file per deployed contract:
//!
//! ```json
//! { "name": "escrow", "address": "EQB4...", "chainId": -3 }
//! ```
//!
//! A contract counts as deployed when some file's `address` matches.

use crate::AdminError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One deployment record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Human label.
    #[serde(default)]
    pub name: Option<String>,
    /// Contract address.
    pub address: String,
    /// Chain the contract lives on.
    pub chain_id: i64,
    /// File the record was read from.
    #[serde(skip)]
    pub source: PathBuf,
}

/// Read every `*.json` deployment record in `dir`. Files that do not parse
/// as a deployment record are skipped.
///
/// # Errors
///
/// `DeploymentsUnreadable` if the directory cannot be listed.
pub fn load(dir: &Path) -> Result<Vec<Deployment>, AdminError> {
    let unreadable = |source| AdminError::DeploymentsUnreadable {
        dir: dir.to_path_buf(),
        source,
    };
    let mut deployments = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(raw) = fs::read_to_string(&path) else {
            continue;
        };
        if let Ok(mut deployment) = serde_json::from_str::<Deployment>(&raw) {
            deployment.source = path;
            deployments.push(deployment);
        }
    }
    deployments.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(deployments)
}

/// Find the deployment for `contract`.
///
/// # Errors
///
/// `ContractNotDeployed` when no record matches, `DeploymentsUnreadable`
/// when the directory cannot be listed.
pub fn require(dir: &Path, contract: &str) -> Result<Deployment, AdminError> {
    let contract = contract.trim();
    load(dir)?
        .into_iter()
        .find(|d| d.address.trim() == contract)
        .ok_or_else(|| AdminError::ContractNotDeployed {
            contract: contract.to_string(),
            dir: dir.to_path_buf(),
        })
}
