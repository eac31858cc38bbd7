//! # Swap Coordinator Node
//!
//! Loads configuration from `SWAP_*` environment variables, starts the
//! subsystems and serves requests as JSON lines: one request envelope per
//! line on stdin, one response per line on stdout.
//!
//! ```text
//! stdin ──line──→ RequestCoordinator ──→ EscrowService ──→ bus ──→ metrics bridge
//!                    │       │                    ↑
//! stdout ←──response─┘       └─TrackFunding─→ FundingWatcher ←── ChainRelayer ←── Esplora
//! ```
//!
//! Requests that act on the sender's identity are signed with the key the
//! sender shares with the node (`SWAP_SENDER_KEYS`).
//!
//! The node stops on Ctrl+C or when stdin closes.

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime, SwapContainer};
use swap_telemetry::init_telemetry;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;
    config.validate().context("Invalid configuration")?;

    let container = SwapContainer::new(config).context("Failed to build subsystems")?;
    let runtime = NodeRuntime::new(container);
    runtime.start()?;

    info!("Node is running. Reading requests from stdin; Ctrl+C to stop.");
    tokio::select! {
        result = serve_stdio(&runtime) => {
            if let Err(e) = result {
                error!(error = %e, "Request loop failed");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C");
        }
    }

    runtime.shutdown().await;
    Ok(())
}

async fn serve_stdio(runtime: &NodeRuntime) -> Result<()> {
    let coordinator = runtime.container().coordinator.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = coordinator.handle_json(&line);
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        stdout.write_all(&encoded).await?;
        stdout.flush().await?;
    }
    info!("stdin closed");
    Ok(())
}
