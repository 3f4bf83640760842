//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `visitors_operator_reconciliations_total` - Total number of reconciliations
//! - `visitors_operator_reconciliation_errors_total` - Total number of reconciliation errors
//! - `visitors_operator_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `visitors_operator_requeues_total` - Requeues by reason
//! - `visitors_operator_resources_created_total` - Owned objects created, by kind
//! - `visitors_operator_drift_corrections_total` - Replica corrections, by tier
//! - `visitors_operator_status_writes_total` - Status fields written to a VisitorsApp

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "visitors_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "visitors_operator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "visitors_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "visitors_operator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static RESOURCES_CREATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "visitors_operator_resources_created_total",
            "Total number of owned resources created by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RESOURCES_CREATED_TOTAL metric - this should never happen")
});

static DRIFT_CORRECTIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "visitors_operator_drift_corrections_total",
            "Total number of replica count corrections by tier",
        ),
        &["tier"],
    )
    .expect("Failed to create DRIFT_CORRECTIONS_TOTAL metric - this should never happen")
});

static STATUS_WRITES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "visitors_operator_status_writes_total",
        "Total number of status fields written",
    )
    .expect("Failed to create STATUS_WRITES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESOURCES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DRIFT_CORRECTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_WRITES_TOTAL.clone()))?;

    Ok(())
}

/// Everything registered so far, for the `/metrics` endpoint
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_resources_created(kind: &str) {
    RESOURCES_CREATED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_drift_corrections(tier: &str) {
    DRIFT_CORRECTIONS_TOTAL.with_label_values(&[tier]).inc();
}

pub fn increment_status_writes() {
    STATUS_WRITES_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // The only test that registers; a second registration would fail
        assert!(register_metrics().is_ok());
        assert!(!gather().is_empty());
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        assert!(RECONCILIATIONS_TOTAL.get() > before);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        assert!(RECONCILIATION_ERRORS_TOTAL.get() > before);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(0.25);
        assert!(RECONCILIATION_DURATION.get_sample_count() > before);
    }

    #[test]
    fn test_labelled_counters_are_independent() {
        let secret_before = RESOURCES_CREATED_TOTAL.with_label_values(&["Secret"]).get();
        let service_before = RESOURCES_CREATED_TOTAL.with_label_values(&["Service"]).get();

        increment_resources_created("Secret");

        assert!(RESOURCES_CREATED_TOTAL.with_label_values(&["Secret"]).get() > secret_before);
        assert!(RESOURCES_CREATED_TOTAL.with_label_values(&["Service"]).get() >= service_before);
    }

    #[test]
    fn test_increment_requeues_by_reason() {
        let before = REQUEUES_TOTAL.with_label_values(&["awaiting-readiness"]).get();
        increment_requeues("awaiting-readiness");
        assert!(REQUEUES_TOTAL.with_label_values(&["awaiting-readiness"]).get() > before);
    }
}
