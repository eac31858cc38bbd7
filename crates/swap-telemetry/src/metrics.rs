//! Prometheus metrics for the swap coordinator.
//!
//! All metrics follow the naming convention: `swap_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., ledger_transitions_total)
//! - **Gauge**: Value that can go up or down (e.g., relayer_mempool_transactions)
//! - **Histogram**: Distribution of values (e.g., relayer_broadcast_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LEDGER METRICS
    // =========================================================================

    /// Successful ledger transitions
    pub static ref LEDGER_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("swap_ledger_transitions_total", "Successful escrow/order transitions"),
        &["ledger", "status"]  // ledger: escrow/order, status: created/locked/funded/claimed/refunded
    ).expect("metric creation failed");

    /// Rejected ledger operations
    pub static ref LEDGER_FAILURES: CounterVec = CounterVec::new(
        Opts::new("swap_ledger_failures_total", "Rejected ledger operations by error kind"),
        &["operation", "error"]
    ).expect("metric creation failed");

    /// Records refunded by the periodic sweep
    pub static ref REFUND_SWEEP_REFUNDED: Counter = Counter::new(
        "swap_refund_sweep_refunded_total",
        "Expired records refunded by the periodic sweep"
    ).expect("metric creation failed");

    // =========================================================================
    // COORDINATOR METRICS
    // =========================================================================

    /// Requests handled by the coordinator
    pub static ref COORDINATOR_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("swap_coordinator_requests_total", "Requests handled by the coordinator"),
        &["op", "outcome"]  // outcome: ok/rejected
    ).expect("metric creation failed");

    // =========================================================================
    // RELAYER METRICS
    // =========================================================================

    /// Broadcast attempts
    pub static ref RELAYER_BROADCAST_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("swap_relayer_broadcast_attempts_total", "Broadcast attempts by outcome"),
        &["outcome"]  // outcome: ok/transient/permanent
    ).expect("metric creation failed");

    /// Broadcast duration including retries
    pub static ref RELAYER_BROADCAST_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "swap_relayer_broadcast_duration_seconds",
            "Time spent broadcasting, retries included"
        ).buckets(exponential_buckets(0.01, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Poll errors
    pub static ref RELAYER_POLL_ERRORS: Counter = Counter::new(
        "swap_relayer_poll_errors_total",
        "Status polls that failed and were retried"
    ).expect("metric creation failed");

    /// Transactions in the local mempool view
    pub static ref RELAYER_MEMPOOL_SIZE: Gauge = Gauge::new(
        "swap_relayer_mempool_transactions",
        "Transactions tracked in the local mempool view"
    ).expect("metric creation failed");

    // =========================================================================
    // NOTIFIER METRICS
    // =========================================================================

    /// Events delivered through the notifier
    pub static ref NOTIFIER_EVENTS: CounterVec = CounterVec::new(
        Opts::new("swap_notifier_events_total", "Events observed on the notifier bus"),
        &["topic"]
    ).expect("metric creation failed");
}

/// Handle to the metrics registry.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(LEDGER_TRANSITIONS.clone()),
        Box::new(LEDGER_FAILURES.clone()),
        Box::new(REFUND_SWEEP_REFUNDED.clone()),
        Box::new(COORDINATOR_REQUESTS.clone()),
        Box::new(RELAYER_BROADCAST_ATTEMPTS.clone()),
        Box::new(RELAYER_BROADCAST_DURATION.clone()),
        Box::new(RELAYER_POLL_ERRORS.clone()),
        Box::new(RELAYER_MEMPOOL_SIZE.clone()),
        Box::new(NOTIFIER_EVENTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
