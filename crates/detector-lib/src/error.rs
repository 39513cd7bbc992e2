//! Error types for the overload detector
//!
//! Configuration problems and malformed host state are reported as
//! `DetectorError` values. Insufficient history is not an error: policies
//! handle it by delegating to their fallback.

use crate::models::ResourceDimension;
use thiserror::Error;

/// Result type alias for detector operations.
pub type Result<T> = std::result::Result<T, DetectorError>;

/// Main error type for the overload detector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    // Policy configuration errors
    #[error("The safety parameter cannot be less than zero. The passed value is: {value}")]
    InvalidSafetyParameter { value: f64 },

    #[error("Utilization threshold for {dimension} must be a positive finite number, got {value}")]
    InvalidUtilizationThreshold {
        dimension: ResourceDimension,
        value: f64,
    },

    #[error("Minimum history for {dimension} must be at least one sample")]
    InvalidMinimumHistory { dimension: ResourceDimension },

    #[error("Weight {name} must be a non-negative finite number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    // Host model errors
    #[error("Host {host_id} has invalid {dimension} capacity: {value}")]
    InvalidCapacity {
        host_id: String,
        dimension: ResourceDimension,
        value: f64,
    },

    #[error("Host {host_id} received {dimension} utilization sample {value} outside [0, 1]")]
    InvalidSample {
        host_id: String,
        dimension: ResourceDimension,
        value: f64,
    },

    #[error("VM {vm_id} has invalid {dimension} demand: {value}")]
    InvalidDemand {
        vm_id: String,
        dimension: ResourceDimension,
        value: f64,
    },

    #[error("History window size must be at least one entry")]
    InvalidHistoryWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_parameter_message() {
        let err = DetectorError::InvalidSafetyParameter { value: -0.5 };
        assert_eq!(
            err.to_string(),
            "The safety parameter cannot be less than zero. The passed value is: -0.5"
        );
    }

    #[test]
    fn test_capacity_message_names_dimension() {
        let err = DetectorError::InvalidCapacity {
            host_id: "host-1".to_string(),
            dimension: ResourceDimension::Iops,
            value: 0.0,
        };
        assert!(err.to_string().contains("iops"));
        assert!(err.to_string().contains("host-1"));
    }
}
