//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `hermes_reconciliations_total{kind}` - Total number of reconciliations
//! - `hermes_reconciliation_errors_total{kind}` - Total number of reconciliation errors
//! - `hermes_reconciliation_duration_seconds{kind}` - Duration of reconciliation operations
//! - `hermes_provider_requests_total{provider,outcome}` - Provider send attempts by outcome
//! - `hermes_provider_request_duration_seconds{provider}` - Duration of provider requests
//! - `hermes_emails_delivered_total{status}` - Terminal delivery statuses written
//! - `hermes_sender_config_validations_total{status}` - Sender configuration validations

use anyhow::Result;
use prometheus::{HistogramVec, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "hermes_reconciliations_total",
            "Total number of reconciliations by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "hermes_reconciliation_errors_total",
            "Total number of reconciliation errors by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "hermes_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds by resource kind",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static PROVIDER_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "hermes_provider_requests_total",
            "Total number of provider send attempts by provider and outcome",
        ),
        &["provider", "outcome"],
    )
    .expect("Failed to create PROVIDER_REQUESTS_TOTAL metric - this should never happen")
});

static PROVIDER_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "hermes_provider_request_duration_seconds",
            "Duration of provider send attempts in seconds by provider",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["provider"],
    )
    .expect("Failed to create PROVIDER_REQUEST_DURATION metric - this should never happen")
});

static EMAILS_DELIVERED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "hermes_emails_delivered_total",
            "Total number of terminal delivery statuses recorded on Email resources",
        ),
        &["status"],
    )
    .expect("Failed to create EMAILS_DELIVERED_TOTAL metric - this should never happen")
});

static SENDER_CONFIG_VALIDATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "hermes_sender_config_validations_total",
            "Total number of EmailSenderConfig validations by resulting status",
        ),
        &["status"],
    )
    .expect("Failed to create SENDER_CONFIG_VALIDATIONS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(PROVIDER_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROVIDER_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(EMAILS_DELIVERED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SENDER_CONFIG_VALIDATIONS_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

pub fn observe_provider_request(provider: &str, outcome: &str, duration: f64) {
    PROVIDER_REQUESTS_TOTAL
        .with_label_values(&[provider, outcome])
        .inc();
    PROVIDER_REQUEST_DURATION
        .with_label_values(&[provider])
        .observe(duration);
}

pub fn increment_emails_delivered(status: &str) {
    EMAILS_DELIVERED_TOTAL.with_label_values(&[status]).inc();
}

pub fn increment_sender_config_validations(status: &str) {
    SENDER_CONFIG_VALIDATIONS_TOTAL
        .with_label_values(&[status])
        .inc();
}
