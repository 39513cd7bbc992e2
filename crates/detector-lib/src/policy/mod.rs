//! Host overload detection policies
//!
//! This module provides:
//! - The `OverloadDetection` trait shared by all policies
//! - An inter-quartile range policy with an adaptive, history-derived threshold
//! - A static threshold policy, the usual fallback for the adaptive one
//! - Settings passed through to the migration orchestrator

mod iqr;
mod settings;
mod static_threshold;

pub use iqr::{InterQuartileRangePolicy, DEFAULT_MIN_HISTORY};
pub use settings::{MigrationSettings, VmSelectionPolicy};
pub use static_threshold::{StaticThresholdPolicy, DEFAULT_UTILIZATION_THRESHOLD};

use crate::host::MonitoredHost;
use crate::models::ResourceDimension;

/// Trait for overload detection implementations
///
/// Policies are shared between evaluation threads, hosts are not: each call
/// borrows its host mutably because an adaptive evaluation appends to the
/// host's threshold history.
pub trait OverloadDetection: Send + Sync {
    /// Short policy name used in logs and metric labels
    fn name(&self) -> &'static str;

    /// Decide whether `host` is over-utilized in `dimension`
    fn is_overloaded_in(&self, host: &mut dyn MonitoredHost, dimension: ResourceDimension) -> bool;

    /// Threshold `is_overloaded_in` would compare against, with no side effects
    ///
    /// Follows fallback delegation, so the value belongs to whichever policy
    /// would answer. `None` when that policy has no single threshold.
    fn current_threshold(&self, _host: &dyn MonitoredHost, _dimension: ResourceDimension) -> Option<f64> {
        None
    }

    /// Compute (MIPS) overload check
    fn is_overloaded(&self, host: &mut dyn MonitoredHost) -> bool {
        self.is_overloaded_in(host, ResourceDimension::Mips)
    }

    /// I/O (IOPS) overload check
    fn is_overloaded_io(&self, host: &mut dyn MonitoredHost) -> bool {
        self.is_overloaded_in(host, ResourceDimension::Iops)
    }
}
