//! Static utilization threshold policy
//!
//! A host is overloaded in a dimension when its requested utilization
//! exceeds a fixed cap. Needs no history, which makes it the usual fallback
//! for adaptive policies. A fixed cap carries no trend, so nothing is written
//! to the host's threshold history.

use super::OverloadDetection;
use crate::error::{DetectorError, Result};
use crate::host::MonitoredHost;
use crate::models::ResourceDimension;
use crate::observability::{DetectorLogger, DetectorMetrics};

/// Default utilization cap for both dimensions
pub const DEFAULT_UTILIZATION_THRESHOLD: f64 = 0.8;

const POLICY_NAME: &str = "static-threshold";

/// Fixed-threshold overload detection
#[derive(Debug, Clone)]
pub struct StaticThresholdPolicy {
    mips_threshold: f64,
    iops_threshold: f64,
    metrics: DetectorMetrics,
    logger: DetectorLogger,
}

impl StaticThresholdPolicy {
    /// Create a policy applying `utilization_threshold` to both dimensions
    pub fn new(utilization_threshold: f64) -> Result<Self> {
        let logger = DetectorLogger::new(POLICY_NAME);
        for dimension in ResourceDimension::ALL {
            validate_threshold(&logger, dimension, utilization_threshold)?;
        }
        Ok(Self {
            mips_threshold: utilization_threshold,
            iops_threshold: utilization_threshold,
            metrics: DetectorMetrics::new(),
            logger,
        })
    }

    /// Use a separate cap for the I/O dimension
    pub fn with_io_threshold(mut self, threshold: f64) -> Result<Self> {
        validate_threshold(&self.logger, ResourceDimension::Iops, threshold)?;
        self.iops_threshold = threshold;
        Ok(self)
    }

    pub fn threshold(&self, dimension: ResourceDimension) -> f64 {
        match dimension {
            ResourceDimension::Mips => self.mips_threshold,
            ResourceDimension::Iops => self.iops_threshold,
        }
    }
}

impl Default for StaticThresholdPolicy {
    fn default() -> Self {
        Self {
            mips_threshold: DEFAULT_UTILIZATION_THRESHOLD,
            iops_threshold: DEFAULT_UTILIZATION_THRESHOLD,
            metrics: DetectorMetrics::new(),
            logger: DetectorLogger::new(POLICY_NAME),
        }
    }
}

fn validate_threshold(
    logger: &DetectorLogger,
    dimension: ResourceDimension,
    value: f64,
) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        return Ok(());
    }
    let err = DetectorError::InvalidUtilizationThreshold { dimension, value };
    logger.log_invalid_configuration(&err.to_string());
    Err(err)
}

impl OverloadDetection for StaticThresholdPolicy {
    fn name(&self) -> &'static str {
        POLICY_NAME
    }

    fn is_overloaded_in(&self, host: &mut dyn MonitoredHost, dimension: ResourceDimension) -> bool {
        let threshold = self.threshold(dimension);
        let utilization = host.requested_utilization(dimension);

        let overloaded = utilization > threshold;
        self.metrics.record_decision(POLICY_NAME, dimension, overloaded);
        self.logger
            .log_decision(host.host_id(), dimension, utilization, threshold, overloaded);
        overloaded
    }

    fn current_threshold(&self, _host: &dyn MonitoredHost, dimension: ResourceDimension) -> Option<f64> {
        Some(self.threshold(dimension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::models::Vm;

    fn host_with_load(mips: f64, iops: f64) -> Host {
        let mut host = Host::new("host-1", 1000.0, 100.0).unwrap();
        host.add_vm(Vm::new("vm-1", mips, iops).unwrap());
        host
    }

    #[test]
    fn test_over_threshold() {
        let policy = StaticThresholdPolicy::new(0.8).unwrap();
        let mut host = host_with_load(850.0, 10.0);

        assert!(policy.is_overloaded(&mut host));
        assert!(!policy.is_overloaded_io(&mut host));
    }

    #[test]
    fn test_equal_to_threshold_is_not_overloaded() {
        let policy = StaticThresholdPolicy::new(0.5).unwrap();
        let mut host = host_with_load(500.0, 50.0);

        assert!(!policy.is_overloaded(&mut host));
        assert!(!policy.is_overloaded_io(&mut host));
    }

    #[test]
    fn test_separate_io_threshold() {
        let policy = StaticThresholdPolicy::new(0.9)
            .unwrap()
            .with_io_threshold(0.3)
            .unwrap();
        let mut host = host_with_load(500.0, 40.0);

        assert!(!policy.is_overloaded(&mut host));
        assert!(policy.is_overloaded_io(&mut host));
        assert_eq!(policy.threshold(ResourceDimension::Iops), 0.3);
    }

    #[test]
    fn test_threshold_history_untouched() {
        let policy = StaticThresholdPolicy::default();
        let mut host = host_with_load(100.0, 10.0);

        policy.is_overloaded(&mut host);
        policy.is_overloaded_io(&mut host);

        assert!(host.threshold_history(ResourceDimension::Mips).is_empty());
        assert!(host.threshold_history(ResourceDimension::Iops).is_empty());
        assert_eq!(
            policy.current_threshold(&host, ResourceDimension::Iops),
            Some(DEFAULT_UTILIZATION_THRESHOLD)
        );
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        assert!(StaticThresholdPolicy::new(0.0).is_err());
        assert!(StaticThresholdPolicy::new(f64::NAN).is_err());
        assert!(matches!(
            StaticThresholdPolicy::new(0.8).unwrap().with_io_threshold(-1.0),
            Err(DetectorError::InvalidUtilizationThreshold {
                dimension: ResourceDimension::Iops,
                ..
            })
        ));
    }
}
