//! Observability for overload policies
//!
//! Provides:
//! - Prometheus metrics (evaluations, overload decisions, fallback delegations, thresholds)
//! - Structured logging of policy decisions with tracing

use crate::models::ResourceDimension;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::sync::OnceLock;
use tracing::{debug, error, warn};

/// Histogram buckets for adaptive thresholds (ratios, may leave [0, 1])
const THRESHOLD_BUCKETS: &[f64] = &[
    0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.75, 0.8, 0.85, 0.9, 0.95, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DetectorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct DetectorMetricsInner {
    evaluations: IntCounterVec,
    overloaded: IntCounterVec,
    fallback_delegations: IntCounterVec,
    adaptive_threshold: HistogramVec,
}

impl DetectorMetricsInner {
    fn new() -> Self {
        Self {
            evaluations: register_int_counter_vec!(
                "hod_evaluations_total",
                "Overload evaluations answered by a policy",
                &["policy", "dimension"]
            )
            .expect("Failed to register hod_evaluations_total"),

            overloaded: register_int_counter_vec!(
                "hod_overloaded_total",
                "Evaluations that found the host overloaded",
                &["policy", "dimension"]
            )
            .expect("Failed to register hod_overloaded_total"),

            fallback_delegations: register_int_counter_vec!(
                "hod_fallback_delegations_total",
                "Evaluations delegated to the fallback policy due to insufficient history",
                &["dimension"]
            )
            .expect("Failed to register hod_fallback_delegations_total"),

            adaptive_threshold: register_histogram_vec!(
                "hod_adaptive_threshold",
                "Adaptive thresholds computed from utilization history",
                &["dimension"],
                THRESHOLD_BUCKETS.to_vec()
            )
            .expect("Failed to register hod_adaptive_threshold"),
        }
    }
}

/// Detector metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone, Debug)]
pub struct DetectorMetrics {
    _private: (),
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DetectorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DetectorMetricsInner {
        GLOBAL_METRICS.get_or_init(DetectorMetricsInner::new)
    }

    /// Record an answered evaluation and its outcome
    pub fn record_decision(&self, policy: &str, dimension: ResourceDimension, overloaded: bool) {
        let labels = [policy, dimension.as_str()];
        self.inner().evaluations.with_label_values(&labels).inc();
        if overloaded {
            self.inner().overloaded.with_label_values(&labels).inc();
        }
    }

    pub fn inc_fallback_delegations(&self, dimension: ResourceDimension) {
        self.inner()
            .fallback_delegations
            .with_label_values(&[dimension.as_str()])
            .inc();
    }

    pub fn observe_adaptive_threshold(&self, dimension: ResourceDimension, threshold: f64) {
        self.inner()
            .adaptive_threshold
            .with_label_values(&[dimension.as_str()])
            .observe(threshold);
    }

    pub fn evaluations(&self, policy: &str, dimension: ResourceDimension) -> u64 {
        self.inner()
            .evaluations
            .with_label_values(&[policy, dimension.as_str()])
            .get()
    }

    pub fn fallback_delegations(&self, dimension: ResourceDimension) -> u64 {
        self.inner()
            .fallback_delegations
            .with_label_values(&[dimension.as_str()])
            .get()
    }

    /// Encode the default registry in the Prometheus text exposition format
    pub fn export_text(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Structured logger for policy events
#[derive(Clone, Debug)]
pub struct DetectorLogger {
    policy: &'static str,
}

impl DetectorLogger {
    pub fn new(policy: &'static str) -> Self {
        Self { policy }
    }

    /// Log the outcome of one evaluation
    pub fn log_decision(
        &self,
        host_id: &str,
        dimension: ResourceDimension,
        utilization: f64,
        threshold: f64,
        overloaded: bool,
    ) {
        if overloaded {
            warn!(
                event = "overload_detected",
                policy = self.policy,
                host_id = %host_id,
                dimension = %dimension,
                utilization = utilization,
                threshold = threshold,
                "Host over-utilized"
            );
        } else {
            debug!(
                event = "host_evaluated",
                policy = self.policy,
                host_id = %host_id,
                dimension = %dimension,
                utilization = utilization,
                threshold = threshold,
                "Host within threshold"
            );
        }
    }

    /// Log a delegation to the fallback policy
    pub fn log_fallback(
        &self,
        host_id: &str,
        dimension: ResourceDimension,
        leading_samples: usize,
        required_samples: usize,
        fallback: &str,
    ) {
        debug!(
            event = "fallback_delegated",
            policy = self.policy,
            host_id = %host_id,
            dimension = %dimension,
            leading_samples = leading_samples,
            required_samples = required_samples,
            fallback = %fallback,
            "Insufficient history, delegating to fallback policy"
        );
    }

    /// Log a history sample that is not a utilization ratio
    pub fn log_invalid_sample(&self, host_id: &str, dimension: ResourceDimension, sample: f64) {
        warn!(
            event = "invalid_history",
            policy = self.policy,
            host_id = %host_id,
            dimension = %dimension,
            sample = sample,
            "Utilization history holds a sample outside [0, 1], ignoring it for thresholds"
        );
    }

    /// Log a rejected policy configuration
    pub fn log_invalid_configuration(&self, reason: &str) {
        error!(
            event = "invalid_configuration",
            policy = self.policy,
            reason = %reason,
            "Policy configuration rejected"
        );
    }
}
