//! Host model and the history capability consumed by overload policies

use crate::error::{DetectorError, Result};
use crate::history::{
    BoundedHistory, ThresholdRecord, DEFAULT_THRESHOLD_HISTORY, DEFAULT_UTILIZATION_HISTORY,
};
use crate::models::{HostSnapshot, ResourceDimension, Vm};
use crate::stats::is_utilization_ratio;

/// Read/append access a policy needs from a host
///
/// Implementors own their histories exclusively; policies take `&mut` so a
/// host is never evaluated concurrently with itself. `Host` validates its
/// capacities and samples; other implementors must uphold the same
/// requirements, documented per method.
pub trait MonitoredHost {
    /// Host identifier used in logs and metrics
    fn host_id(&self) -> &str;

    /// Total capacity in the given dimension (MIPS or IOPS)
    ///
    /// Must be finite and strictly positive: requested utilization divides
    /// by it.
    fn capacity(&self, dimension: ResourceDimension) -> f64;

    /// Sum of currently requested demand over all hosted VMs
    fn requested(&self, dimension: ResourceDimension) -> f64;

    /// Utilization ratios in [0, 1], oldest first
    ///
    /// The leading non-zero run is counted from the oldest sample, so a
    /// single zero near the old end keeps the adaptive policy on its
    /// fallback until that sample is evicted from the window, however many
    /// recent samples are non-zero. A history holding a non-finite or
    /// out-of-range sample is never used for an adaptive threshold.
    fn utilization_history(&self, dimension: ResourceDimension) -> Vec<f64>;

    /// Append an adaptive threshold record for external trend analysis
    fn record_threshold(&mut self, dimension: ResourceDimension, record: ThresholdRecord);

    /// Requested utilization ratio in the given dimension
    fn requested_utilization(&self, dimension: ResourceDimension) -> f64 {
        self.requested(dimension) / self.capacity(dimension)
    }
}

/// Per-dimension history state
#[derive(Debug, Clone)]
struct DimensionHistory {
    utilization: BoundedHistory<f64>,
    thresholds: BoundedHistory<ThresholdRecord>,
}

impl DimensionHistory {
    fn new(utilization_window: usize, threshold_window: usize) -> Result<Self> {
        Ok(Self {
            utilization: BoundedHistory::new(utilization_window)?,
            thresholds: BoundedHistory::new(threshold_window)?,
        })
    }
}

/// A physical host with its VMs and per-dimension histories
#[derive(Debug, Clone)]
pub struct Host {
    id: String,
    total_mips: f64,
    total_iops: f64,
    vms: Vec<Vm>,
    mips: DimensionHistory,
    iops: DimensionHistory,
}

impl Host {
    /// Create a host with the default history windows
    pub fn new(id: impl Into<String>, total_mips: f64, total_iops: f64) -> Result<Self> {
        Self::with_windows(
            id,
            total_mips,
            total_iops,
            DEFAULT_UTILIZATION_HISTORY,
            DEFAULT_THRESHOLD_HISTORY,
        )
    }

    /// Create a host with custom utilization and threshold window sizes
    pub fn with_windows(
        id: impl Into<String>,
        total_mips: f64,
        total_iops: f64,
        utilization_window: usize,
        threshold_window: usize,
    ) -> Result<Self> {
        let id = id.into();
        for (dimension, value) in [
            (ResourceDimension::Mips, total_mips),
            (ResourceDimension::Iops, total_iops),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DetectorError::InvalidCapacity {
                    host_id: id.clone(),
                    dimension,
                    value,
                });
            }
        }

        Ok(Self {
            id,
            total_mips,
            total_iops,
            vms: Vec::new(),
            mips: DimensionHistory::new(utilization_window, threshold_window)?,
            iops: DimensionHistory::new(utilization_window, threshold_window)?,
        })
    }

    /// Build a host from a snapshot, validating capacities, VMs and samples
    pub fn from_snapshot(snapshot: &HostSnapshot) -> Result<Self> {
        let window = snapshot
            .mips_history
            .len()
            .max(snapshot.iops_history.len())
            .max(DEFAULT_UTILIZATION_HISTORY);
        let mut host = Self::with_windows(
            snapshot.id.clone(),
            snapshot.total_mips,
            snapshot.total_iops,
            window,
            DEFAULT_THRESHOLD_HISTORY,
        )?;

        for vm in &snapshot.vms {
            host.add_vm(Vm::new(vm.id.clone(), vm.requested_mips, vm.requested_iops)?);
        }
        for sample in &snapshot.mips_history {
            host.record_utilization(ResourceDimension::Mips, *sample)?;
        }
        for sample in &snapshot.iops_history {
            host.record_utilization(ResourceDimension::Iops, *sample)?;
        }
        Ok(host)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vms(&self) -> &[Vm] {
        &self.vms
    }

    pub fn add_vm(&mut self, vm: Vm) {
        self.vms.push(vm);
    }

    /// Remove a VM by id, returning it if it was hosted here
    pub fn remove_vm(&mut self, vm_id: &str) -> Option<Vm> {
        let idx = self.vms.iter().position(|vm| vm.id == vm_id)?;
        Some(self.vms.remove(idx))
    }

    /// Append a utilization ratio sample for one evaluation cycle
    pub fn record_utilization(&mut self, dimension: ResourceDimension, ratio: f64) -> Result<()> {
        if !is_utilization_ratio(ratio) {
            return Err(DetectorError::InvalidSample {
                host_id: self.id.clone(),
                dimension,
                value: ratio,
            });
        }
        self.dimension_mut(dimension).utilization.push(ratio);
        Ok(())
    }

    /// Threshold records for the given dimension, oldest first
    pub fn threshold_history(&self, dimension: ResourceDimension) -> Vec<ThresholdRecord> {
        self.dimension(dimension).thresholds.to_vec()
    }

    /// Most recent threshold record for the given dimension
    pub fn last_threshold(&self, dimension: ResourceDimension) -> Option<ThresholdRecord> {
        self.dimension(dimension).thresholds.latest().copied()
    }

    fn dimension(&self, dimension: ResourceDimension) -> &DimensionHistory {
        match dimension {
            ResourceDimension::Mips => &self.mips,
            ResourceDimension::Iops => &self.iops,
        }
    }

    fn dimension_mut(&mut self, dimension: ResourceDimension) -> &mut DimensionHistory {
        match dimension {
            ResourceDimension::Mips => &mut self.mips,
            ResourceDimension::Iops => &mut self.iops,
        }
    }
}

impl MonitoredHost for Host {
    fn host_id(&self) -> &str {
        &self.id
    }

    fn capacity(&self, dimension: ResourceDimension) -> f64 {
        match dimension {
            ResourceDimension::Mips => self.total_mips,
            ResourceDimension::Iops => self.total_iops,
        }
    }

    fn requested(&self, dimension: ResourceDimension) -> f64 {
        self.vms.iter().map(|vm| vm.requested(dimension)).sum()
    }

    fn utilization_history(&self, dimension: ResourceDimension) -> Vec<f64> {
        self.dimension(dimension).utilization.to_vec()
    }

    fn record_threshold(&mut self, dimension: ResourceDimension, record: ThresholdRecord) {
        self.dimension_mut(dimension).thresholds.push(record);
    }
}
