//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a utilization ratio as a percentage
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Format an optional threshold, `-` when the policy has none
pub fn format_threshold(threshold: Option<f64>) -> String {
    threshold.map(format_ratio).unwrap_or_else(|| "-".to_string())
}

/// Color an overload status
pub fn color_overload(overloaded: bool) -> String {
    if overloaded {
        "OVERLOADED".red().bold().to_string()
    } else {
        "ok".green().to_string()
    }
}
