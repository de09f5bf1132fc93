//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use sicro_lib::{audit::format_event, RunReport, ScalingAction, ScalingEvent};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Output format for the run summary
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// One scaling event as displayed in the summary table
#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Tick")]
    tick: usize,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Replicas")]
    replicas: u32,
}

impl From<&ScalingEvent> for EventRow {
    fn from(event: &ScalingEvent) -> Self {
        Self {
            tick: event.tick,
            timestamp: event.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            action: color_action(event.action),
            replicas: event.resulting_replicas,
        }
    }
}

/// Machine-readable run summary
#[derive(Serialize)]
struct RunSummary<'a> {
    model: &'a str,
    samples: usize,
    anomalies: usize,
    scale_ups: usize,
    scale_downs: usize,
    peak_replicas: u32,
    final_replicas: Option<u32>,
    audit_log: Vec<String>,
}

/// Print the result of a controller run
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<EventRow> = report.events.iter().map(EventRow::from).collect();
            if rows.is_empty() {
                print_warning("No scaling events");
            } else {
                let table = Table::new(rows).with(Style::rounded()).to_string();
                println!("{}", table);
            }

            print_info(&format!(
                "{} samples classified by {}, {} anomalous ({})",
                report.samples(),
                report.model,
                report.anomalies,
                format_ratio(report.anomalies, report.samples())
            ));
            print_success(&format!(
                "Infrastructure optimized. {} scaling events logged ({} up, {} down), final replicas: {}",
                report.events.len(),
                report.count(ScalingAction::ScaleUp),
                report.count(ScalingAction::ScaleDown),
                report
                    .final_replicas()
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
        }
        OutputFormat::Json => {
            let summary = RunSummary {
                model: &report.model,
                samples: report.samples(),
                anomalies: report.anomalies,
                scale_ups: report.count(ScalingAction::ScaleUp),
                scale_downs: report.count(ScalingAction::ScaleDown),
                peak_replicas: report.replicas.iter().copied().max().unwrap_or(0),
                final_replicas: report.final_replicas(),
                audit_log: report.events.iter().map(format_event).collect(),
            };
            if let Ok(json) = serde_json::to_string_pretty(&summary) {
                println!("{}", json);
            }
        }
    }
}

/// Dump all registered Prometheus metrics in text exposition format
pub fn write_metrics(path: &Path) -> Result<()> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    std::fs::write(path, buffer).with_context(|| format!("Failed to write metrics to {:?}", path))
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

/// Format a count as a percentage of a total
pub fn format_ratio(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// Color an action by direction
pub fn color_action(action: ScalingAction) -> String {
    let label = action.to_string();
    match action {
        ScalingAction::ScaleUp => label.red().to_string(),
        ScalingAction::ScaleDown => label.green().to_string(),
        ScalingAction::Maintain => label,
    }
}
