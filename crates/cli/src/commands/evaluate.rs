//! Evaluate hosts from a snapshot file

use anyhow::{Context, Result};
use colored::Colorize;
use detector_lib::{
    Host, HostSnapshot, MonitoredHost, OverloadDecision, OverloadDetection, ResourceDimension,
};
use std::path::Path;
use tabled::Tabled;

use crate::config::DetectorConfig;
use crate::output::{color_overload, format_ratio, format_threshold, print_info, OutputFormat};

/// Row for the evaluation table
#[derive(Tabled)]
struct DecisionRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Dimension")]
    dimension: String,
    #[tabled(rename = "Utilization")]
    utilization: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Read host snapshots (a JSON array) from `path`
pub fn load_snapshots(path: &Path) -> Result<Vec<HostSnapshot>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse hosts file {}", path.display()))
}

/// Evaluate every host in both dimensions
pub fn evaluate_hosts(
    policy: &dyn OverloadDetection,
    snapshots: &[HostSnapshot],
) -> Result<Vec<OverloadDecision>> {
    let mut decisions = Vec::with_capacity(snapshots.len() * 2);

    for snapshot in snapshots {
        let mut host = Host::from_snapshot(snapshot)
            .with_context(|| format!("Invalid host {}", snapshot.id))?;

        for dimension in ResourceDimension::ALL {
            let threshold = policy.current_threshold(&host, dimension);
            let overloaded = policy.is_overloaded_in(&mut host, dimension);

            decisions.push(OverloadDecision {
                host_id: host.id().to_string(),
                dimension,
                utilization: host.requested_utilization(dimension),
                threshold,
                overloaded,
            });
        }
    }

    Ok(decisions)
}

/// Run the `evaluate` command
pub fn run(config: &DetectorConfig, hosts_path: &Path, format: OutputFormat) -> Result<()> {
    let snapshots = load_snapshots(hosts_path)?;
    let host_ids = snapshots.iter().map(|s| s.id.clone()).collect();
    let policy = config.build_policy(host_ids)?;

    let decisions = evaluate_hosts(&policy, &snapshots)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&decisions)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if decisions.is_empty() {
                print_info("No hosts to evaluate");
                return Ok(());
            }

            let rows: Vec<DecisionRow> = decisions
                .iter()
                .map(|d| DecisionRow {
                    host: d.host_id.clone(),
                    dimension: d.dimension.to_string(),
                    utilization: format_ratio(d.utilization),
                    threshold: format_threshold(d.threshold),
                    status: color_overload(d.overloaded),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            let overloaded_hosts = snapshots
                .iter()
                .filter(|s| decisions.iter().any(|d| d.overloaded && d.host_id == s.id))
                .count();
            println!(
                "\n{} of {} hosts overloaded",
                overloaded_hosts.to_string().bold(),
                snapshots.len()
            );
        }
    }

    Ok(())
}
