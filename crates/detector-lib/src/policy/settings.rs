//! Migration settings carried by overload policies
//!
//! These values belong to the orchestrator that drives migrations. Overload
//! policies accept them at construction and expose them unchanged.

use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// VM selection heuristic used by the orchestrator once a host is overloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VmSelectionPolicy {
    /// Pick the VM that migrates fastest (least memory)
    #[default]
    MinimumMigrationTime,
    /// Pick the VM with the lowest current utilization
    MinimumUtilization,
    /// Pick the VM whose load correlates most with the host's
    MaximumCorrelation,
    /// Pick uniformly at random
    RandomSelection,
}

impl VmSelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmSelectionPolicy::MinimumMigrationTime => "minimum-migration-time",
            VmSelectionPolicy::MinimumUtilization => "minimum-utilization",
            VmSelectionPolicy::MaximumCorrelation => "maximum-correlation",
            VmSelectionPolicy::RandomSelection => "random-selection",
        }
    }
}

impl fmt::Display for VmSelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VmSelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "minimum-migration-time" | "mmt" => Ok(VmSelectionPolicy::MinimumMigrationTime),
            "minimum-utilization" | "mu" => Ok(VmSelectionPolicy::MinimumUtilization),
            "maximum-correlation" | "mc" => Ok(VmSelectionPolicy::MaximumCorrelation),
            "random-selection" | "rs" => Ok(VmSelectionPolicy::RandomSelection),
            other => Err(format!("unknown VM selection policy: {other}")),
        }
    }
}

/// Orchestrator-facing parameters of a migration policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationSettings {
    /// Hosts managed by the orchestrator
    pub hosts: Vec<String>,
    /// VM selection for compute overload
    pub vm_selection: VmSelectionPolicy,
    /// VM selection for I/O overload
    pub vm_selection_io: VmSelectionPolicy,
    /// Weight of compute utilization when ranking hosts
    pub weight_mips: f64,
    /// Weight of I/O utilization when ranking hosts
    pub weight_iops: f64,
    /// Optional utilization threshold override for the orchestrator
    pub utilization_threshold: Option<f64>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            vm_selection: VmSelectionPolicy::default(),
            vm_selection_io: VmSelectionPolicy::default(),
            weight_mips: 0.5,
            weight_iops: 0.5,
            utilization_threshold: None,
        }
    }
}

impl MigrationSettings {
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_weights(mut self, weight_mips: f64, weight_iops: f64) -> Self {
        self.weight_mips = weight_mips;
        self.weight_iops = weight_iops;
        self
    }

    pub fn with_utilization_threshold(mut self, threshold: f64) -> Self {
        self.utilization_threshold = Some(threshold);
        self
    }

    /// Check the weights are usable by the orchestrator
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("weight_mips", self.weight_mips), ("weight_iops", self.weight_iops)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DetectorError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}
