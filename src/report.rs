//! Run report.
//!
//! Serializable record of one run: the parameters, the seed actually used,
//! every scheduled event in submission order, and the dispatch counters.
//! Written as JSON or YAML depending on the output file extension.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{bail, Context, Result};
use serde::Serialize;

use crate::config::SimulationParams;
use crate::network::DispatchStats;
use crate::scheduler::{RunSummary, ScheduledEvent};
use crate::timeline::TimelineSummary;

#[derive(Debug, Clone, Serialize)]
pub struct TimelineReport {
    pub params: SimulationParams,
    pub seed: u64,
    pub num_infrastructure_nodes: usize,
    pub timeline: TimelineSummary,
    pub run: RunSummary,
    pub dispatch: DispatchStats,
    pub events: Vec<ScheduledEvent>,
}

/// Output encoding, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Yaml,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(ReportFormat::Json),
            Some("yaml") | Some("yml") => Some(ReportFormat::Yaml),
            _ => None,
        }
    }
}

/// Serialize the report in the given format
pub fn render_report(report: &TimelineReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report).context("Failed to serialize report to JSON"),
        ReportFormat::Yaml => serde_yaml::to_string(report).context("Failed to serialize report to YAML"),
    }
}

/// Write the report to `output_path`
pub fn write_report(report: &TimelineReport, output_path: &Path) -> Result<()> {
    let Some(format) = ReportFormat::from_path(output_path) else {
        bail!(
            "Unsupported report extension for '{}', expected .json, .yaml or .yml",
            output_path.display()
        );
    };

    let content = render_report(report, format)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    log::info!("Report written to {}", output_path.display());
    Ok(())
}
