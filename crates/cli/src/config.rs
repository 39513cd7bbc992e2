//! Policy configuration for the CLI
//!
//! Sources, lowest precedence first: built-in defaults, the default config
//! file (`~/.config/hod/config.toml`) or the one given with `--config`,
//! then `HOD_*` environment variables.

use anyhow::{Context, Result};
use detector_lib::policy::{DEFAULT_MIN_HISTORY, DEFAULT_UTILIZATION_THRESHOLD};
use detector_lib::{
    InterQuartileRangePolicy, MigrationSettings, ResourceDimension, StaticThresholdPolicy,
    VmSelectionPolicy,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Multiplier applied to the utilization IQR
    #[serde(default = "default_safety_parameter")]
    pub safety_parameter: f64,

    /// Static threshold used when history is insufficient
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: f64,

    /// Separate static I/O threshold (defaults to `fallback_threshold`)
    #[serde(default)]
    pub fallback_threshold_io: Option<f64>,

    #[serde(default = "default_min_history")]
    pub min_history_mips: usize,

    #[serde(default = "default_min_history")]
    pub min_history_iops: usize,

    #[serde(default = "default_weight")]
    pub weight_mips: f64,

    #[serde(default = "default_weight")]
    pub weight_iops: f64,

    #[serde(default)]
    pub vm_selection: VmSelectionPolicy,

    #[serde(default)]
    pub vm_selection_io: VmSelectionPolicy,

    /// Utilization threshold override handed to the orchestrator
    #[serde(default)]
    pub utilization_threshold: Option<f64>,
}

fn default_safety_parameter() -> f64 {
    1.5
}

fn default_fallback_threshold() -> f64 {
    DEFAULT_UTILIZATION_THRESHOLD
}

fn default_min_history() -> usize {
    DEFAULT_MIN_HISTORY
}

fn default_weight() -> f64 {
    0.5
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            safety_parameter: default_safety_parameter(),
            fallback_threshold: default_fallback_threshold(),
            fallback_threshold_io: None,
            min_history_mips: default_min_history(),
            min_history_iops: default_min_history(),
            weight_mips: default_weight(),
            weight_iops: default_weight(),
            vm_selection: VmSelectionPolicy::default(),
            vm_selection_io: VmSelectionPolicy::default(),
            utilization_threshold: None,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from file and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let config = builder
            .add_source(config::Environment::with_prefix("HOD"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Orchestrator settings for the given hosts
    pub fn migration_settings(&self, hosts: Vec<String>) -> MigrationSettings {
        MigrationSettings {
            hosts,
            vm_selection: self.vm_selection,
            vm_selection_io: self.vm_selection_io,
            weight_mips: self.weight_mips,
            weight_iops: self.weight_iops,
            utilization_threshold: self.utilization_threshold,
        }
    }

    /// Build the IQR policy with its static fallback
    pub fn build_policy(&self, hosts: Vec<String>) -> Result<InterQuartileRangePolicy> {
        let mut fallback = StaticThresholdPolicy::new(self.fallback_threshold)
            .context("Invalid fallback threshold")?;
        if let Some(io_threshold) = self.fallback_threshold_io {
            fallback = fallback
                .with_io_threshold(io_threshold)
                .context("Invalid fallback I/O threshold")?;
        }

        let policy = InterQuartileRangePolicy::new(
            self.migration_settings(hosts),
            self.safety_parameter,
            Arc::new(fallback),
        )
        .context("Invalid IQR policy configuration")?
        .with_min_history(ResourceDimension::Mips, self.min_history_mips)
        .context("Invalid minimum history for mips")?
        .with_min_history(ResourceDimension::Iops, self.min_history_iops)
        .context("Invalid minimum history for iops")?;

        Ok(policy)
    }
}

/// Get the default configuration file path
fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("hod").join("config.toml"))
}
