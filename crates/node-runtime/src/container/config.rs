//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Requirements
//!
//! - The administrator identity (`SWAP_ADMIN`) MUST be set; without it the
//!   resolver whitelist could never change
//! - The administrator MUST have a shared key in `SWAP_SENDER_KEYS`; unsigned
//!   requests cannot claim an identity
//! - All timeouts and limits have sane defaults with override capability
//!
//! ## Environment Variables
//!
//! | Variable | Section | Default |
//! |----------|---------|---------|
//! | `SWAP_ADMIN` | escrow | none (required) |
//! | `SWAP_REFUND_SWEEP` | escrow | `true` |
//! | `SWAP_REFUND_SWEEP_INTERVAL_SECS` | escrow | `60` |
//! | `SWAP_MAX_MESSAGE_AGE_SECS` | coordinator | `60` |
//! | `SWAP_MAX_FUTURE_SKEW_SECS` | coordinator | `10` |
//! | `SWAP_SENDER_KEYS` | coordinator | empty (`sender=hexkey,...`) |
//! | `SWAP_RELAYER_CHAIN_ID` | relayer | `-1000` (Bitcoin) |
//! | `SWAP_MIN_CONFIRMATIONS` | relayer | chain default |
//! | `SWAP_POLL_INTERVAL_SECS` | relayer | `30` |
//! | `SWAP_MEMPOOL_RETENTION_SECS` | relayer | `86400` |
//! | `SWAP_RETRY_MAX_ATTEMPTS` | relayer | `5` |
//! | `SWAP_RETRY_INITIAL_BACKOFF_MS` | relayer | `500` |
//! | `SWAP_RETRY_MAX_BACKOFF_MS` | relayer | `30000` |
//! | `SWAP_ESPLORA_URL` | backend | none (relayer disabled) |
//! | `SWAP_ESPLORA_TIMEOUT_SECS` | backend | `30` |
//! | `SWAP_BUS_CAPACITY` | notifier | `1000` |
//!
//! Telemetry variables are read by `TelemetryConfig::from_lookup`.

use shared_types::{Address, ChainId, SenderKeys};
use std::str::FromStr;
use std::time::Duration;
use sw_02_chain_relayer::RelayerConfig;
use swap_telemetry::TelemetryConfig;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Escrow core configuration.
    pub escrow: EscrowConfig,
    /// Request coordinator configuration.
    pub coordinator: CoordinatorConfig,
    /// Chain relayer configuration.
    pub relayer: RelayerConfig,
    /// Chain backend configuration.
    pub backend: BackendConfig,
    /// Notifier configuration.
    pub notifier: NotifierConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(admin) = lookup("SWAP_ADMIN") {
            let admin = Address::new(admin.clone()).map_err(|e| ConfigError::InvalidValue {
                key: "SWAP_ADMIN",
                value: admin,
                reason: e.to_string(),
            })?;
            config.escrow.admin = Some(admin);
        }
        if let Some(enabled) = parse_bool(&lookup, "SWAP_REFUND_SWEEP")? {
            config.escrow.refund_sweep_enabled = enabled;
        }
        if let Some(secs) = parse(&lookup, "SWAP_REFUND_SWEEP_INTERVAL_SECS")? {
            config.escrow.refund_sweep_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse(&lookup, "SWAP_MAX_MESSAGE_AGE_SECS")? {
            config.coordinator.max_message_age_secs = secs;
        }
        if let Some(secs) = parse(&lookup, "SWAP_MAX_FUTURE_SKEW_SECS")? {
            config.coordinator.max_future_skew_secs = secs;
        }
        if let Some(spec) = lookup("SWAP_SENDER_KEYS") {
            config.coordinator.sender_keys =
                SenderKeys::parse(&spec).map_err(|e| ConfigError::InvalidValue {
                    key: "SWAP_SENDER_KEYS",
                    value: "<redacted>".to_string(),
                    reason: e.to_string(),
                })?;
        }

        if let Some(chain) = parse::<i64, _>(&lookup, "SWAP_RELAYER_CHAIN_ID")? {
            config.relayer = RelayerConfig::for_chain(ChainId(chain));
        }
        if let Some(depth) = parse(&lookup, "SWAP_MIN_CONFIRMATIONS")? {
            config.relayer.min_confirmations = depth;
        }
        if let Some(secs) = parse(&lookup, "SWAP_POLL_INTERVAL_SECS")? {
            config.relayer.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse(&lookup, "SWAP_MEMPOOL_RETENTION_SECS")? {
            config.relayer.retention_secs = secs;
        }
        if let Some(attempts) = parse(&lookup, "SWAP_RETRY_MAX_ATTEMPTS")? {
            config.relayer.retry.max_attempts = attempts;
        }
        if let Some(ms) = parse(&lookup, "SWAP_RETRY_INITIAL_BACKOFF_MS")? {
            config.relayer.retry.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "SWAP_RETRY_MAX_BACKOFF_MS")? {
            config.relayer.retry.max_backoff = Duration::from_millis(ms);
        }

        config.backend.esplora_url = lookup("SWAP_ESPLORA_URL").filter(|url| !url.is_empty());
        if let Some(secs) = parse(&lookup, "SWAP_ESPLORA_TIMEOUT_SECS")? {
            config.backend.request_timeout = Duration::from_secs(secs);
        }

        if let Some(capacity) = parse(&lookup, "SWAP_BUS_CAPACITY")? {
            config.notifier.channel_capacity = capacity;
        }

        Ok(config)
    }

    /// Check the configuration before starting the node.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - the administrator identity is not set
    /// - the administrator has no shared key
    /// - `min_confirmations` is zero
    /// - the retry policy allows zero attempts
    /// - the poll interval or bus capacity is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(admin) = &self.escrow.admin else {
            return Err(ConfigError::MissingAdmin);
        };
        if !self.coordinator.sender_keys.contains(admin) {
            return Err(ConfigError::MissingAdminKey(admin.clone()));
        }
        if self.relayer.min_confirmations == 0 {
            return Err(ConfigError::ZeroMinConfirmations);
        }
        if self.relayer.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroRetryAttempts);
        }
        if self.relayer.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.notifier.channel_capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Administrator identity is not set.
    #[error("administrator identity is not set; set SWAP_ADMIN")]
    MissingAdmin,

    /// Administrator cannot sign requests.
    #[error("no shared key for administrator {0}; add it to SWAP_SENDER_KEYS")]
    MissingAdminKey(Address),

    /// A variable could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },

    /// Confirmation depth must be at least one block.
    #[error("min_confirmations must be at least 1")]
    ZeroMinConfirmations,

    /// Broadcast needs at least one attempt.
    #[error("retry max_attempts must be at least 1")]
    ZeroRetryAttempts,

    /// Poll interval must be positive.
    #[error("poll interval must be positive")]
    ZeroPollInterval,

    /// Bus capacity must be positive.
    #[error("bus capacity must be positive")]
    ZeroBusCapacity,
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Escrow core configuration.
#[derive(Debug, Clone)]
pub struct EscrowConfig {
    /// Identity allowed to change the resolver whitelist.
    pub admin: Option<Address>,
    /// Run the periodic refund sweep.
    pub refund_sweep_enabled: bool,
    /// Interval between sweeps.
    pub refund_sweep_interval: Duration,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            admin: None,
            refund_sweep_enabled: true,
            refund_sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Request coordinator configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Oldest accepted envelope timestamp, relative to now.
    pub max_message_age_secs: u64,
    /// Furthest accepted future envelope timestamp, relative to now.
    pub max_future_skew_secs: u64,
    /// Shared keys of senders that may sign envelopes.
    pub sender_keys: SenderKeys,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_message_age_secs: 60,
            max_future_skew_secs: 10,
            sender_keys: SenderKeys::new(),
        }
    }
}

/// Chain backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Esplora base URL. The relayer is disabled when unset.
    pub esplora_url: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            esplora_url: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Notifier configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Broadcast channel capacity. Slower subscribers skip events.
    pub channel_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
