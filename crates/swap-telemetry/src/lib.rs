//! # Swap Telemetry
//!
//! Structured logging and Prometheus metrics for the swap coordinator.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use swap_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SWAP_SERVICE_NAME` | `hashlock-swap` | Service name in logs |
//! | `SWAP_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SWAP_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `SWAP_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, COORDINATOR_REQUESTS, LEDGER_FAILURES,
    LEDGER_TRANSITIONS, NOTIFIER_EVENTS, REFUND_SWEEP_REFUNDED, RELAYER_BROADCAST_ATTEMPTS,
    RELAYER_BROADCAST_DURATION, RELAYER_MEMPOOL_SIZE, RELAYER_POLL_ERRORS,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first; they do not depend on the subscriber.
    let metrics_handle = register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for creating a span with component context.
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
