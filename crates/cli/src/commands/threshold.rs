//! Preview the adaptive threshold for a utilization series

use anyhow::{bail, Result};
use colored::Colorize;
use detector_lib::stats::{count_non_zero_beginning, interquartile_range, is_utilization_ratio};
use detector_lib::{InterQuartileRangePolicy, OverloadDetection, ResourceDimension};
use serde::Serialize;

use crate::config::DetectorConfig;
use crate::output::{format_ratio, print_warning, OutputFormat};

/// Threshold preview for one series
#[derive(Debug, Serialize)]
pub struct ThresholdPreview {
    pub dimension: ResourceDimension,
    pub samples: usize,
    pub leading_non_zero: usize,
    pub required: usize,
    pub iqr: Option<f64>,
    /// `None` when the fallback policy would decide
    pub threshold: Option<f64>,
    pub fallback: &'static str,
}

pub fn preview(
    policy: &InterQuartileRangePolicy,
    samples: &[f64],
    dimension: ResourceDimension,
) -> ThresholdPreview {
    let threshold = policy.adaptive_threshold(samples, dimension);
    ThresholdPreview {
        dimension,
        samples: samples.len(),
        leading_non_zero: count_non_zero_beginning(samples),
        required: policy.min_history(dimension),
        iqr: threshold.map(|_| interquartile_range(samples)),
        threshold,
        fallback: policy.fallback().name(),
    }
}

/// Reject samples that are not utilization ratios in [0, 1]
pub fn validate_samples(samples: &[f64]) -> Result<()> {
    if let Some((idx, sample)) = samples
        .iter()
        .enumerate()
        .find(|(_, s)| !is_utilization_ratio(**s))
    {
        bail!(
            "Sample {} is {}, utilization samples must be finite ratios in [0, 1]",
            idx + 1,
            sample
        );
    }
    Ok(())
}

/// Run the `threshold` command
pub fn run(
    config: &DetectorConfig,
    samples: &[f64],
    dimension: ResourceDimension,
    format: OutputFormat,
) -> Result<()> {
    validate_samples(samples)?;
    let policy = config.build_policy(Vec::new())?;
    let result = preview(&policy, samples, dimension);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Adaptive Threshold".bold());
            println!("{}", "=".repeat(50));
            println!("Dimension:              {}", result.dimension.to_string().cyan());
            println!("Safety Parameter:       {}", policy.safety_parameter());
            println!("Samples:                {}", result.samples);
            println!(
                "Leading Non-Zero:       {} (required {})",
                result.leading_non_zero, result.required
            );
            println!();

            match (result.iqr, result.threshold) {
                (Some(iqr), Some(threshold)) => {
                    println!("IQR:                    {:.4}", iqr);
                    println!("Threshold:              {}", format_ratio(threshold).green());
                }
                _ => {
                    print_warning(&format!(
                        "Insufficient history, the {} policy decides",
                        result.fallback
                    ));
                }
            }
        }
    }

    Ok(())
}
