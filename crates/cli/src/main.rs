//! Host Overload Detector CLI
//!
//! A command-line tool for evaluating host snapshots against the adaptive
//! IQR overload policy, previewing thresholds and validating configuration.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{evaluate, threshold, validate};
use detector_lib::{DetectorMetrics, ResourceDimension};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Host Overload Detector CLI
#[derive(Parser)]
#[command(name = "hod")]
#[command(author, version, about = "CLI for Host Overload Detector", long_about = None)]
pub struct Cli {
    /// Policy configuration file (TOML, YAML or JSON)
    #[arg(long, short, env = "HOD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Dump policy metrics (Prometheus text format) to stderr after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate hosts from a JSON snapshot file in both dimensions
    Evaluate {
        /// Path to a JSON array of host snapshots
        hosts: PathBuf,
    },

    /// Preview the adaptive threshold for a utilization series
    Threshold {
        /// Utilization ratios, oldest first (comma separated)
        #[arg(long, short, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        samples: Vec<f64>,

        /// Resource dimension (mips or iops)
        #[arg(long, short, default_value = "mips")]
        dimension: ResourceDimension,
    },

    /// Validate the policy configuration
    Validate,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Load configuration
    let config = config::DetectorConfig::load(cli.config.as_deref())?;
    debug!(
        safety_parameter = config.safety_parameter,
        fallback_threshold = config.fallback_threshold,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Evaluate { hosts } => {
            evaluate::run(&config, &hosts, cli.format)?;
        }
        Commands::Threshold { samples, dimension } => {
            threshold::run(&config, &samples, dimension, cli.format)?;
        }
        Commands::Validate => {
            validate::run(&config, cli.format)?;
        }
    }

    if cli.metrics {
        let text = DetectorMetrics::new()
            .export_text()
            .context("Failed to encode metrics")?;
        eprint!("{}", text);
    }

    Ok(())
}
