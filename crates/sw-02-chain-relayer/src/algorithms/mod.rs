//! # Algorithms Module
//!
//! Retry scheduling and backend error classification.

pub mod retry;

pub use retry::{classify_error, ErrorClass, RetryPolicy};
