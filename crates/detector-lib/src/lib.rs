//! Host overload detection library
//!
//! This crate provides the core functionality for:
//! - Per-dimension (compute and I/O) utilization history on hosts
//! - Adaptive, IQR-derived overload thresholds with fallback delegation
//! - Static threshold overload detection
//! - Structured logging and Prometheus metrics for policy decisions

pub mod error;
pub mod history;
pub mod host;
pub mod models;
pub mod observability;
pub mod policy;
pub mod stats;

pub use error::{DetectorError, Result};
pub use history::{BoundedHistory, ThresholdRecord};
pub use host::{Host, MonitoredHost};
pub use models::*;
pub use observability::{DetectorLogger, DetectorMetrics};
pub use policy::{
    InterQuartileRangePolicy, MigrationSettings, OverloadDetection, StaticThresholdPolicy,
    VmSelectionPolicy,
};
