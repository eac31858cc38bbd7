//! Structured logging macros.
//!
//! Every log line carries a `component` field; swap-specific lines also carry
//! `kind` and `hashlock` so one record can be followed across components.

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with component
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with component
    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with component
    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with component
    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a record-related event with standard fields.
#[macro_export]
macro_rules! log_swap_event {
    ($level:ident, $component:expr, $msg:expr, $kind:expr, $hashlock:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            kind = %$kind,
            hashlock = %$hashlock,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a chain transaction event with standard fields.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $component:expr, $msg:expr, $tx_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            tx_id = %$tx_id,
            $($($field)*,)?
            $msg
        )
    };
}
