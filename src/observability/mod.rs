//! # Observability
//!
//! Prometheus metrics collection. Structured logging uses `tracing` directly.

pub mod metrics;

// Re-export for convenience
pub use metrics::*;
