//! Validate the policy configuration

use anyhow::Result;
use colored::Colorize;
use detector_lib::{OverloadDetection, ResourceDimension};

use crate::config::DetectorConfig;
use crate::output::{print_success, OutputFormat};

/// Run the `validate` command
///
/// Building the policy is the validation: any configuration error is
/// returned and the process exits non-zero.
pub fn run(config: &DetectorConfig, format: OutputFormat) -> Result<()> {
    let policy = config.build_policy(Vec::new())?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            print_success("Configuration is valid");
            println!();
            println!("{}", "IQR Policy".bold());
            println!("{}", "-".repeat(50));
            println!("Safety Parameter:       {}", policy.safety_parameter());
            for dimension in ResourceDimension::ALL {
                println!(
                    "Min History ({}):      {}",
                    dimension,
                    policy.min_history(dimension)
                );
            }
            println!("Fallback:               {}", policy.fallback().name());
            println!("Fallback Threshold:     {}", config.fallback_threshold);
            if let Some(io) = config.fallback_threshold_io {
                println!("Fallback I/O Threshold: {}", io);
            }
            println!();
            println!("{}", "Migration Settings".bold());
            println!("{}", "-".repeat(50));
            let settings = policy.settings();
            println!("VM Selection:           {}", settings.vm_selection);
            println!("VM Selection (I/O):     {}", settings.vm_selection_io);
            println!(
                "Weights (mips/iops):    {} / {}",
                settings.weight_mips, settings.weight_iops
            );
            if let Some(threshold) = settings.utilization_threshold {
                println!("Utilization Threshold:  {}", threshold);
            }
        }
    }

    Ok(())
}
