//! # Node Runtime
//!
//! Owns the container and the background tasks, and stops them together.
//!
//! ## Startup Sequence
//!
//! 1. Build the container (configuration already validated)
//! 2. Start the metrics bridge
//! 3. Start the funding watcher (when a chain backend is configured)
//! 4. Start the refund sweeper (when enabled)

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapters::metrics_bridge;
use crate::container::SwapContainer;

/// The running node.
pub struct NodeRuntime {
    container: Arc<SwapContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl NodeRuntime {
    /// Wrap a built container. Nothing runs until `start`.
    pub fn new(container: SwapContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The container.
    pub fn container(&self) -> &Arc<SwapContainer> {
        &self.container
    }

    /// Spawn the background tasks.
    ///
    /// # Errors
    ///
    /// Fails if the runtime was already started.
    pub fn start(&self) -> Result<()> {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            bail!("Node runtime already started");
        }

        tasks.push((
            "metrics_bridge",
            metrics_bridge::spawn(&self.container.event_bus, self.shutdown_rx.clone()),
        ));

        if let Some(watcher) = &self.container.funding_watcher {
            let handle = watcher
                .spawn(self.shutdown_rx.clone())
                .context("Failed to start funding watcher")?;
            tasks.push(("funding_watcher", handle));
        }

        if let Some(sweeper) = self.container.refund_sweeper() {
            tasks.push(("refund_sweeper", sweeper.spawn(self.shutdown_rx.clone())));
        }

        info!(tasks = tasks.len(), "Node runtime started");
        Ok(())
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for (name, task) in tasks {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "Background task ended abnormally");
            }
        }
        info!("Shutdown complete");
    }

    /// A receiver that flips to `true` on shutdown.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }
}
