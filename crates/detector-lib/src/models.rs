//! Core data models for the overload detector

use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resource dimension evaluated by an overload policy
///
/// The two dimensions are fully independent: each has its own capacity,
/// demand, utilization history and threshold history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceDimension {
    /// Compute throughput (MIPS)
    Mips,
    /// I/O throughput (IOPS)
    Iops,
}

impl ResourceDimension {
    pub const ALL: [ResourceDimension; 2] = [ResourceDimension::Mips, ResourceDimension::Iops];

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceDimension::Mips => "mips",
            ResourceDimension::Iops => "iops",
        }
    }
}

impl fmt::Display for ResourceDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceDimension {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mips" | "cpu" | "compute" => Ok(ResourceDimension::Mips),
            "iops" | "io" => Ok(ResourceDimension::Iops),
            other => Err(format!("unknown resource dimension: {other}")),
        }
    }
}

/// A virtual machine hosted on a node
///
/// Demands are absolute units (MIPS, IOPS), not ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    pub id: String,
    pub requested_mips: f64,
    pub requested_iops: f64,
}

impl Vm {
    pub fn new(id: impl Into<String>, requested_mips: f64, requested_iops: f64) -> Result<Self> {
        let vm = Self {
            id: id.into(),
            requested_mips,
            requested_iops,
        };
        for dimension in ResourceDimension::ALL {
            let value = vm.requested(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(DetectorError::InvalidDemand {
                    vm_id: vm.id.clone(),
                    dimension,
                    value,
                });
            }
        }
        Ok(vm)
    }

    /// Currently requested demand in the given dimension
    pub fn requested(&self, dimension: ResourceDimension) -> f64 {
        match dimension {
            ResourceDimension::Mips => self.requested_mips,
            ResourceDimension::Iops => self.requested_iops,
        }
    }
}

/// Serializable description of a host, used to build `Host` values from files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub id: String,
    pub total_mips: f64,
    pub total_iops: f64,
    #[serde(default)]
    pub vms: Vec<Vm>,
    /// Compute utilization ratios, oldest first
    #[serde(default)]
    pub mips_history: Vec<f64>,
    /// I/O utilization ratios, oldest first
    #[serde(default)]
    pub iops_history: Vec<f64>,
}

/// Outcome of evaluating one host in one dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverloadDecision {
    pub host_id: String,
    pub dimension: ResourceDimension,
    pub utilization: f64,
    /// Most recent threshold recorded for this host and dimension, if any
    pub threshold: Option<f64>,
    pub overloaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_parsing() {
        assert_eq!("mips".parse::<ResourceDimension>(), Ok(ResourceDimension::Mips));
        assert_eq!("IO".parse::<ResourceDimension>(), Ok(ResourceDimension::Iops));
        assert!("memory".parse::<ResourceDimension>().is_err());
    }

    #[test]
    fn test_vm_rejects_negative_demand() {
        let err = Vm::new("vm-1", -1.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            DetectorError::InvalidDemand {
                dimension: ResourceDimension::Mips,
                ..
            }
        ));
        assert!(Vm::new("vm-2", 100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_vm_requested_by_dimension() {
        let vm = Vm::new("vm-1", 250.0, 40.0).unwrap();
        assert_eq!(vm.requested(ResourceDimension::Mips), 250.0);
        assert_eq!(vm.requested(ResourceDimension::Iops), 40.0);
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: HostSnapshot =
            serde_json::from_str(r#"{"id":"h1","total_mips":1000,"total_iops":500}"#).unwrap();
        assert!(snapshot.vms.is_empty());
        assert!(snapshot.mips_history.is_empty());
        assert!(snapshot.iops_history.is_empty());
    }
}
