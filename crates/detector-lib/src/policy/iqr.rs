//! Inter-quartile range (IQR) overload detection
//!
//! The upper utilization threshold adapts to how volatile a host has been:
//!
//! ```text
//! threshold = 1 - safety_parameter * IQR(utilization history)
//! ```
//!
//! Compute and I/O are evaluated independently, each against its own
//! history. When a dimension has too few leading non-zero samples to give a
//! meaningful IQR, the question is forwarded unchanged to the fallback
//! policy for that dimension only. A history holding a sample that is not a
//! utilization ratio (NaN, infinite, outside [0, 1]) is handled the same
//! way, so a threshold is never derived from it.
//!
//! Only thresholds computed here are written to the host's threshold
//! history; a delegated call leaves it to the fallback.

use super::{MigrationSettings, OverloadDetection};
use crate::error::{DetectorError, Result};
use crate::history::ThresholdRecord;
use crate::host::MonitoredHost;
use crate::models::ResourceDimension;
use crate::observability::{DetectorLogger, DetectorMetrics};
use crate::stats::{count_non_zero_beginning, interquartile_range, is_utilization_ratio};
use std::fmt;
use std::sync::Arc;

/// Leading non-zero samples required before the IQR is trusted
pub const DEFAULT_MIN_HISTORY: usize = 12;

const POLICY_NAME: &str = "iqr";

/// Adaptive-threshold policy with fallback delegation
///
/// The fallback is fixed at construction and shared by reference, so a
/// policy can never be wired into its own fallback chain.
pub struct InterQuartileRangePolicy {
    safety_parameter: f64,
    fallback: Arc<dyn OverloadDetection>,
    min_history_mips: usize,
    min_history_iops: usize,
    settings: MigrationSettings,
    metrics: DetectorMetrics,
    logger: DetectorLogger,
}

impl InterQuartileRangePolicy {
    /// Create an IQR policy
    ///
    /// Fails with `InvalidSafetyParameter` when `safety_parameter` is
    /// negative or NaN, and with `InvalidWeight` when the orchestrator
    /// weights are unusable. No instance exists after a failure.
    pub fn new(
        settings: MigrationSettings,
        safety_parameter: f64,
        fallback: Arc<dyn OverloadDetection>,
    ) -> Result<Self> {
        let logger = DetectorLogger::new(POLICY_NAME);

        if safety_parameter.is_nan() || safety_parameter < 0.0 {
            let err = DetectorError::InvalidSafetyParameter {
                value: safety_parameter,
            };
            logger.log_invalid_configuration(&err.to_string());
            return Err(err);
        }
        if let Err(err) = settings.validate() {
            logger.log_invalid_configuration(&err.to_string());
            return Err(err);
        }

        Ok(Self {
            safety_parameter,
            fallback,
            min_history_mips: DEFAULT_MIN_HISTORY,
            min_history_iops: DEFAULT_MIN_HISTORY,
            settings,
            metrics: DetectorMetrics::new(),
            logger,
        })
    }

    /// Override the minimum leading non-zero history for one dimension
    pub fn with_min_history(mut self, dimension: ResourceDimension, samples: usize) -> Result<Self> {
        if samples == 0 {
            let err = DetectorError::InvalidMinimumHistory { dimension };
            self.logger.log_invalid_configuration(&err.to_string());
            return Err(err);
        }
        match dimension {
            ResourceDimension::Mips => self.min_history_mips = samples,
            ResourceDimension::Iops => self.min_history_iops = samples,
        }
        Ok(self)
    }

    pub fn safety_parameter(&self) -> f64 {
        self.safety_parameter
    }

    pub fn fallback(&self) -> &Arc<dyn OverloadDetection> {
        &self.fallback
    }

    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    pub fn min_history(&self, dimension: ResourceDimension) -> usize {
        match dimension {
            ResourceDimension::Mips => self.min_history_mips,
            ResourceDimension::Iops => self.min_history_iops,
        }
    }

    /// Whether `history` has enough leading non-zero samples for `dimension`
    pub fn has_sufficient_history(&self, history: &[f64], dimension: ResourceDimension) -> bool {
        count_non_zero_beginning(history) >= self.min_history(dimension)
    }

    /// Threshold `is_overloaded_in` would use for `history`, without recording it
    ///
    /// Returns `None` when the history is insufficient or holds a sample
    /// outside [0, 1]. The result is not clamped: a large safety parameter
    /// can push it below zero.
    pub fn adaptive_threshold(&self, history: &[f64], dimension: ResourceDimension) -> Option<f64> {
        if !history.iter().all(|sample| is_utilization_ratio(*sample)) {
            return None;
        }
        if !self.has_sufficient_history(history, dimension) {
            return None;
        }
        Some(1.0 - self.safety_parameter * interquartile_range(history))
    }
}

impl OverloadDetection for InterQuartileRangePolicy {
    fn name(&self) -> &'static str {
        POLICY_NAME
    }

    fn is_overloaded_in(&self, host: &mut dyn MonitoredHost, dimension: ResourceDimension) -> bool {
        let history = host.utilization_history(dimension);
        let Some(threshold) = self.adaptive_threshold(&history, dimension) else {
            if let Some(sample) = history.iter().find(|s| !is_utilization_ratio(**s)) {
                self.logger.log_invalid_sample(host.host_id(), dimension, *sample);
            }
            self.metrics.inc_fallback_delegations(dimension);
            self.logger.log_fallback(
                host.host_id(),
                dimension,
                count_non_zero_beginning(&history),
                self.min_history(dimension),
                self.fallback.name(),
            );
            return self.fallback.is_overloaded_in(host, dimension);
        };

        let utilization = host.requested_utilization(dimension);
        host.record_threshold(dimension, ThresholdRecord::now(threshold, utilization));

        let overloaded = utilization > threshold;
        self.metrics.observe_adaptive_threshold(dimension, threshold);
        self.metrics.record_decision(POLICY_NAME, dimension, overloaded);
        self.logger
            .log_decision(host.host_id(), dimension, utilization, threshold, overloaded);
        overloaded
    }

    fn current_threshold(&self, host: &dyn MonitoredHost, dimension: ResourceDimension) -> Option<f64> {
        let history = host.utilization_history(dimension);
        self.adaptive_threshold(&history, dimension)
            .or_else(|| self.fallback.current_threshold(host, dimension))
    }
}

impl fmt::Debug for InterQuartileRangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterQuartileRangePolicy")
            .field("safety_parameter", &self.safety_parameter)
            .field("fallback", &self.fallback.name())
            .field("min_history_mips", &self.min_history_mips)
            .field("min_history_iops", &self.min_history_iops)
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::models::Vm;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fallback that answers a fixed value and counts calls per dimension
    struct FixedAnswer {
        answer: bool,
        mips_calls: AtomicUsize,
        iops_calls: AtomicUsize,
    }

    impl FixedAnswer {
        fn new(answer: bool) -> Arc<Self> {
            Arc::new(Self {
                answer,
                mips_calls: AtomicUsize::new(0),
                iops_calls: AtomicUsize::new(0),
            })
        }
    }

    impl OverloadDetection for FixedAnswer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn is_overloaded_in(&self, _host: &mut dyn MonitoredHost, dimension: ResourceDimension) -> bool {
            match dimension {
                ResourceDimension::Mips => self.mips_calls.fetch_add(1, Ordering::SeqCst),
                ResourceDimension::Iops => self.iops_calls.fetch_add(1, Ordering::SeqCst),
            };
            self.answer
        }
    }

    /// 13 non-zero samples with IQR = 0.2
    fn volatile_history() -> Vec<f64> {
        vec![0.3, 0.4, 0.5, 0.3, 0.4, 0.5, 0.3, 0.4, 0.5, 0.3, 0.4, 0.5, 0.4]
    }

    fn host(requested_mips: f64, requested_iops: f64) -> Host {
        let mut host = Host::new("host-1", 1000.0, 1000.0).unwrap();
        host.add_vm(Vm::new("vm-1", requested_mips, requested_iops).unwrap());
        host
    }

    fn seed(host: &mut Host, dimension: ResourceDimension, samples: &[f64]) {
        for sample in samples {
            host.record_utilization(dimension, *sample).unwrap();
        }
    }

    fn policy(safety_parameter: f64, fallback: Arc<FixedAnswer>) -> InterQuartileRangePolicy {
        InterQuartileRangePolicy::new(MigrationSettings::default(), safety_parameter, fallback)
            .unwrap()
    }

    #[test]
    fn test_adaptive_threshold_overloaded() {
        let fallback = FixedAnswer::new(false);
        let policy = policy(0.5, fallback.clone());
        let mut host = host(920.0, 0.0);
        seed(&mut host, ResourceDimension::Mips, &volatile_history());

        assert!(policy.is_overloaded(&mut host));
        let record = host.last_threshold(ResourceDimension::Mips).unwrap();
        assert!((record.threshold - 0.9).abs() < 1e-9);
        assert!((record.utilization - 0.92).abs() < 1e-9);
        assert_eq!(fallback.mips_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_adaptive_threshold_not_overloaded() {
        let policy = policy(0.5, FixedAnswer::new(true));
        let mut host = host(850.0, 0.0);
        seed(&mut host, ResourceDimension::Mips, &volatile_history());

        assert!(!policy.is_overloaded(&mut host));
        assert_eq!(host.threshold_history(ResourceDimension::Mips).len(), 1);
    }

    #[test]
    fn test_insufficient_history_delegates_verbatim() {
        for answer in [true, false] {
            let fallback = FixedAnswer::new(answer);
            let policy = policy(0.5, fallback.clone());
            let mut host = host(10.0, 0.0);
            seed(&mut host, ResourceDimension::Mips, &[0.2, 0.3, 0.4, 0.5, 0.6]);

            assert_eq!(policy.is_overloaded(&mut host), answer);
            assert_eq!(fallback.mips_calls.load(Ordering::SeqCst), 1);
            assert!(host.threshold_history(ResourceDimension::Mips).is_empty());
        }
    }

    #[test]
    fn test_zero_sample_cuts_leading_run() {
        let fallback = FixedAnswer::new(true);
        let policy = policy(0.5, fallback.clone());
        let mut host = host(0.0, 0.0);
        let mut samples = vec![0.5; 11];
        samples.push(0.0);
        samples.extend([0.5; 10]);
        seed(&mut host, ResourceDimension::Mips, &samples);

        assert!(policy.is_overloaded(&mut host));
        assert_eq!(fallback.mips_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_safety_parameter_is_fixed_full_threshold() {
        let policy = policy(0.0, FixedAnswer::new(false));
        let mut host = host(1000.0, 0.0);
        seed(&mut host, ResourceDimension::Mips, &volatile_history());
        assert!(!policy.is_overloaded(&mut host));

        host.add_vm(Vm::new("vm-2", 1.0, 0.0).unwrap());
        assert!(policy.is_overloaded(&mut host));
        for record in host.threshold_history(ResourceDimension::Mips) {
            assert_eq!(record.threshold, 1.0);
        }
    }

    #[test]
    fn test_dimensions_are_independent() {
        let fallback = FixedAnswer::new(true);
        let policy = policy(0.5, fallback.clone());
        let mut host = host(100.0, 100.0);
        seed(&mut host, ResourceDimension::Mips, &volatile_history());
        seed(&mut host, ResourceDimension::Iops, &[0.5; 5]);

        assert!(!policy.is_overloaded(&mut host));
        assert!(policy.is_overloaded_io(&mut host));

        assert_eq!(fallback.mips_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fallback.iops_calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.threshold_history(ResourceDimension::Mips).len(), 1);
        assert!(host.threshold_history(ResourceDimension::Iops).is_empty());
    }

    /// Host whose history bypasses `Host` validation
    struct RawHost {
        history: Vec<f64>,
        records: usize,
    }

    impl MonitoredHost for RawHost {
        fn host_id(&self) -> &str {
            "raw"
        }

        fn capacity(&self, _dimension: ResourceDimension) -> f64 {
            1000.0
        }

        fn requested(&self, _dimension: ResourceDimension) -> f64 {
            500.0
        }

        fn utilization_history(&self, _dimension: ResourceDimension) -> Vec<f64> {
            self.history.clone()
        }

        fn record_threshold(&mut self, _dimension: ResourceDimension, _record: ThresholdRecord) {
            self.records += 1;
        }
    }

    #[test]
    fn test_invalid_samples_yield_no_threshold() {
        let policy = policy(0.5, FixedAnswer::new(false));

        assert_eq!(policy.adaptive_threshold(&[f64::NAN; 12], ResourceDimension::Mips), None);
        let alternating: Vec<f64> = (0..12)
            .map(|i| if i % 2 == 0 { -5.0 } else { 3.0 })
            .collect();
        assert_eq!(policy.adaptive_threshold(&alternating, ResourceDimension::Mips), None);

        let mut one_bad = volatile_history();
        one_bad[6] = f64::INFINITY;
        assert_eq!(policy.adaptive_threshold(&one_bad, ResourceDimension::Iops), None);
    }

    #[test]
    fn test_invalid_history_delegates_without_recording() {
        let fallback = FixedAnswer::new(true);
        let policy = policy(0.5, fallback.clone());
        let mut host = RawHost {
            history: vec![f64::NAN; 13],
            records: 0,
        };

        assert!(policy.is_overloaded(&mut host));
        assert_eq!(fallback.mips_calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.records, 0);
    }

    #[test]
    fn test_current_threshold_follows_delegation() {
        let policy = InterQuartileRangePolicy::new(
            MigrationSettings::default(),
            0.5,
            Arc::new(crate::policy::StaticThresholdPolicy::new(0.7).unwrap()),
        )
        .unwrap();
        let mut host = host(0.0, 0.0);
        seed(&mut host, ResourceDimension::Mips, &volatile_history());
        seed(&mut host, ResourceDimension::Iops, &[0.5; 3]);

        let mips = policy.current_threshold(&host, ResourceDimension::Mips).unwrap();
        assert!((mips - 0.9).abs() < 1e-9);
        assert_eq!(policy.current_threshold(&host, ResourceDimension::Iops), Some(0.7));
        assert!(host.threshold_history(ResourceDimension::Mips).is_empty());
    }

    #[test]
    fn test_large_safety_parameter_not_clamped() {
        let policy = policy(10.0, FixedAnswer::new(false));
        let threshold = policy
            .adaptive_threshold(&volatile_history(), ResourceDimension::Mips)
            .unwrap();
        assert!((threshold - -1.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_safety_parameter_rejected() {
        let result =
            InterQuartileRangePolicy::new(MigrationSettings::default(), -0.1, FixedAnswer::new(false));
        assert_eq!(
            result.unwrap_err(),
            DetectorError::InvalidSafetyParameter { value: -0.1 }
        );

        let nan =
            InterQuartileRangePolicy::new(MigrationSettings::default(), f64::NAN, FixedAnswer::new(false));
        assert!(matches!(nan, Err(DetectorError::InvalidSafetyParameter { .. })));
    }

    #[test]
    fn test_min_history_per_dimension() {
        let fallback = FixedAnswer::new(false);
        let policy = policy(0.5, fallback.clone())
            .with_min_history(ResourceDimension::Iops, 4)
            .unwrap();
        let mut host = host(0.0, 990.0);
        seed(&mut host, ResourceDimension::Iops, &[0.5; 5]);

        // IQR of a constant series is 0, so the threshold is 1.0
        assert!(!policy.is_overloaded_io(&mut host));
        assert_eq!(fallback.iops_calls.load(Ordering::SeqCst), 0);
        assert_eq!(policy.min_history(ResourceDimension::Mips), DEFAULT_MIN_HISTORY);
        assert!(policy
            .with_min_history(ResourceDimension::Mips, 0)
            .is_err());
    }

    #[test]
    fn test_settings_passed_through() {
        let settings = MigrationSettings::default()
            .with_hosts(["h1"])
            .with_utilization_threshold(0.7);
        let policy =
            InterQuartileRangePolicy::new(settings.clone(), 1.5, FixedAnswer::new(false)).unwrap();

        assert_eq!(policy.settings(), &settings);
        assert_eq!(policy.safety_parameter(), 1.5);
        assert_eq!(policy.fallback().name(), "fixed");
    }
}
