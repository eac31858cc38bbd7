//! SW-Admin: operator tools for the swap coordinator.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sw_admin::requests::{
    parse_address, parse_key, refund_request, secret_bundle, whitelist_request, Signer,
};

/// SW-Admin: secret generator and request builders
#[derive(Parser, Debug)]
#[command(name = "sw-admin")]
#[command(about = "Build and validate swap coordinator requests")]
struct Args {
    /// Envelope sender (caller identity)
    #[arg(short, long, env = "SWAP_ADMIN", default_value = "admin", global = true)]
    sender: String,

    /// Sender's shared key, hex. Envelopes are signed when set
    #[arg(short, long, env = "SWAP_SENDER_KEY", hide_env_values = true, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a secret and its hashlock, with example requests
    Secret,

    /// Build a refund request for an expired record
    Refund {
        /// Deployed contract address
        #[arg(long)]
        contract: String,
        /// Ledger: "escrow" or "order"
        #[arg(long)]
        kind: String,
        /// Hashlock, hex
        #[arg(long)]
        hash: String,
        /// Directory of deployment records
        #[arg(long, env = "SWAP_DEPLOYMENTS_DIR", default_value = "deployments")]
        deployments: PathBuf,
    },

    /// Build a resolver whitelist update
    Whitelist {
        /// Deployed contract address
        #[arg(long)]
        contract: String,
        /// Resolver address
        #[arg(long)]
        resolver: String,
        /// New whitelist flag
        #[arg(long, action = clap::ArgAction::Set)]
        status: bool,
        /// Directory of deployment records
        #[arg(long, env = "SWAP_DEPLOYMENTS_DIR", default_value = "deployments")]
        deployments: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let sender = parse_address("sender", &args.sender)?;
    let signer = match &args.key {
        Some(key) => Signer::with_key(sender, parse_key(key)?)?,
        None => Signer::unsigned(sender),
    };
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock before unix epoch")?
        .as_secs();

    let output = match args.command {
        Command::Secret => secret_bundle(&signer, now)?.render()?,
        Command::Refund {
            contract,
            kind,
            hash,
            deployments,
        } => refund_request(&deployments, &contract, &kind, &hash, &signer, now)?.to_json()?,
        Command::Whitelist {
            contract,
            resolver,
            status,
            deployments,
        } => whitelist_request(&deployments, &contract, &resolver, status, &signer, now)?
            .to_json()?,
    };
    println!("{output}");
    Ok(())
}
