//! # Swap Container
//!
//! Holds every subsystem instance and wires them together.
//!
//! ## Initialization Order
//!
//! ```text
//! Phase 1: Notifier bus, clock, replay guard (no dependencies)
//! Phase 2: Escrow service (publishes to the bus)
//! Phase 3: Chain relayer + funding watcher (optional, needs a backend)
//! Phase 4: Request coordinator (escrow + replay guard + sender keys,
//!          funding watcher when present)
//! ```
//!
//! ## Thread Safety
//!
//! - Every subsystem is behind an `Arc`; interior state uses `parking_lot` locks.
//! - Ledgers talk to the outside world only through the bus.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use shared_bus::InMemoryEventBus;
use shared_types::{SystemTimeSource, TimeSource};
use sw_01_escrow::EscrowService;
use sw_02_chain_relayer::{BackendError, ChainBackend, ChainRelayer, EsploraBackend};

use crate::adapters::ReplayGuard;
use crate::container::config::{ConfigError, NodeConfig};
use crate::handlers::{FundingWatcher, RefundSweeper, RequestCoordinator};

/// Container construction failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Chain backend could not be built.
    #[error("Chain backend initialization failed: {0}")]
    Backend(#[from] BackendError),
}

/// Central container holding all subsystem instances.
pub struct SwapContainer {
    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    /// Notifier bus. Every ledger transition is published here.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Clock shared by the ledgers, the relayer and the replay guard.
    pub clock: Arc<dyn TimeSource>,

    /// Correlation-id replay guard.
    pub replay_guard: Arc<ReplayGuard>,

    // =========================================================================
    // SUBSYSTEMS
    // =========================================================================
    /// Escrow and order ledgers, resolver registry, refunds (Subsystem 1).
    pub escrow: Arc<EscrowService>,

    /// Chain relayer (Subsystem 2). `None` when no backend is configured.
    pub relayer: Option<ChainRelayer>,

    /// Funding watcher, present with the relayer.
    pub funding_watcher: Option<Arc<FundingWatcher>>,

    /// Request entry point.
    pub coordinator: Arc<RequestCoordinator>,

    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
}

impl SwapContainer {
    /// Build the container from configuration, using the system clock and
    /// an Esplora backend when `backend.esplora_url` is set.
    ///
    /// # Errors
    ///
    /// Invalid configuration or an unbuildable HTTP client.
    #[instrument(name = "container_init", skip(config))]
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        let backend: Option<Arc<dyn ChainBackend>> = match &config.backend.esplora_url {
            Some(url) => Some(Arc::new(EsploraBackend::with_timeout(
                url.clone(),
                config.relayer.chain,
                config.backend.request_timeout,
            )?)),
            None => None,
        };
        Self::with_parts(config, Arc::new(SystemTimeSource), backend)
    }

    /// Build the container with an explicit clock and chain backend.
    ///
    /// # Errors
    ///
    /// `Config` when the configuration fails validation.
    pub fn with_parts(
        config: NodeConfig,
        clock: Arc<dyn TimeSource>,
        backend: Option<Arc<dyn ChainBackend>>,
    ) -> Result<Self, ContainerError> {
        config.validate()?;
        let admin = config.escrow.admin.clone().ok_or(ConfigError::MissingAdmin)?;
        info!(admin = %admin, "Initializing swap container");

        // =====================================================================
        // PHASE 1: Shared Infrastructure
        // =====================================================================
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(
            config.notifier.channel_capacity,
        ));
        let replay_guard = Arc::new(ReplayGuard::new(&config.coordinator, clock.clone()));
        info!(
            bus_capacity = event_bus.capacity(),
            max_message_age_secs = config.coordinator.max_message_age_secs,
            "Phase 1: shared infrastructure ready"
        );

        // =====================================================================
        // PHASE 2: Escrow
        // =====================================================================
        let escrow = Arc::new(EscrowService::new(admin, event_bus.clone(), clock.clone()));
        info!("Phase 2: [01] escrow service initialized");

        // =====================================================================
        // PHASE 3: Chain Relayer
        // =====================================================================
        let relayer = backend.map(|backend| {
            ChainRelayer::new(backend, config.relayer.clone(), clock.clone())
        });
        let funding_watcher = relayer.as_ref().map(|relayer| {
            Arc::new(FundingWatcher::new(
                relayer.clone(),
                escrow.clone(),
                event_bus.clone(),
            ))
        });
        match &relayer {
            Some(relayer) => info!(
                chain = %relayer.chain(),
                min_confirmations = config.relayer.min_confirmations,
                "Phase 3: [02] chain relayer initialized"
            ),
            None => info!("Phase 3: [02] chain relayer disabled (no backend configured)"),
        }

        // =====================================================================
        // PHASE 4: Coordinator
        // =====================================================================
        let mut coordinator = RequestCoordinator::new(
            escrow.clone(),
            replay_guard.clone(),
            config.coordinator.sender_keys.clone(),
        );
        if let Some(watcher) = &funding_watcher {
            coordinator = coordinator.with_funding_watcher(watcher.clone());
        }
        let coordinator = Arc::new(coordinator);
        info!(
            signing_senders = config.coordinator.sender_keys.len(),
            track_funding = funding_watcher.is_some(),
            "Phase 4: request coordinator ready"
        );

        Ok(Self {
            event_bus,
            clock,
            replay_guard,
            escrow,
            relayer,
            funding_watcher,
            coordinator,
            config,
        })
    }

    /// Refund sweeper over this container's subsystems, if enabled.
    pub fn refund_sweeper(&self) -> Option<RefundSweeper> {
        self.config.escrow.refund_sweep_enabled.then(|| {
            RefundSweeper::new(
                self.escrow.clone(),
                self.relayer.clone(),
                self.config.escrow.refund_sweep_interval,
            )
        })
    }
}
