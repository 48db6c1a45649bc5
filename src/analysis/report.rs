//! Report generation for experiment analysis.
//!
//! Writes per-file metric series as JSON, the directory comparison as JSON
//! and an HTML summary with the per-experiment table.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Serialize;

use super::combiner::ComparisonDataset;
use super::types::*;

/// Run information shared by every directory report
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub analysis_timestamp: String,
    pub data_dir: String,
    pub files_found: usize,
    pub files_analyzed: usize,
    pub files_skipped: usize,
}

/// Serialized form of the comparison grid
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub spreading_factors: Vec<u32>,
    pub payload_sizes: Vec<u32>,
    pub cells: Vec<ComparisonCell>,
    pub duplicates: Vec<String>,
}

impl From<&ComparisonDataset> for ComparisonReport {
    fn from(dataset: &ComparisonDataset) -> Self {
        Self {
            spreading_factors: dataset.spreading_factors.clone(),
            payload_sizes: dataset.payload_sizes.clone(),
            cells: dataset.grid().into_iter().flatten().collect(),
            duplicates: dataset.duplicates.clone(),
        }
    }
}

/// Everything a directory pass reports
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub metadata: ReportMetadata,
    /// Sorted by (spreading factor, payload size)
    pub experiments: Vec<ExperimentRow>,
    pub comparison: ComparisonReport,
}

impl DirectoryReport {
    pub fn new(
        metadata: ReportMetadata,
        summaries: &[FileSummary],
        comparison: &ComparisonDataset,
    ) -> Self {
        let mut experiments: Vec<ExperimentRow> = summaries.iter().map(ExperimentRow::from).collect();
        experiments.sort_by_key(|row| (row.spreading_factor, row.payload_size));

        Self {
            metadata,
            experiments,
            comparison: ComparisonReport::from(comparison),
        }
    }
}

/// Write the metrics of one file (entries, rolling series, statistics)
pub fn write_file_metrics(summary: &FileSummary, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .context("Failed to serialize file metrics to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write file metrics to {}", output_path.display()))?;

    log::info!("File metrics written to {}", output_path.display());
    Ok(())
}

/// Generate JSON report
pub fn generate_json_report(report: &DirectoryReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn optional(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn join_numbers(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

const HTML_STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }
h1, h2 { color: #2c3e50; }
.container { max-width: 1200px; margin: 0 auto; }
.summary { background-color: #f9f9f9; padding: 20px; border-radius: 5px; margin-bottom: 20px; }
table { width: 100%; border-collapse: collapse; margin: 20px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
tr:nth-child(even) { background-color: #f9f9f9; }
td.absent { color: #999; font-style: italic; }";

/// Render the HTML summary report
pub fn render_html_report(report: &DirectoryReport) -> String {
    let mut html = String::new();
    let spreading_factors: Vec<u32> = {
        let mut sfs: Vec<u32> = report.experiments.iter().filter_map(|r| r.spreading_factor).collect();
        sfs.sort_unstable();
        sfs.dedup();
        sfs
    };
    let payload_sizes: Vec<u32> = {
        let mut sizes: Vec<u32> = report.experiments.iter().filter_map(|r| r.payload_size).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    };

    // Writing into a String cannot fail
    let _ = writeln!(html, "<!DOCTYPE html>\n<html>\n<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">\n<title>LoRaWAN analysis report</title>");
    let _ = writeln!(html, "<style>\n{}\n</style>\n</head>\n<body>\n<div class=\"container\">", HTML_STYLE);
    let _ = writeln!(html, "<h1>LoRaWAN analysis report</h1>");
    let _ = writeln!(html, "<p>Generated {}</p>", escape_html(&report.metadata.analysis_timestamp));

    let _ = writeln!(html, "<div class=\"summary\">\n<h2>Tested configurations</h2>");
    let _ = writeln!(html, "<p>Experiments analyzed: {}</p>", report.experiments.len());
    let _ = writeln!(html, "<p>Spreading factors: {}</p>", join_numbers(&spreading_factors));
    let _ = writeln!(html, "<p>Payload sizes: {} bytes</p>\n</div>", join_numbers(&payload_sizes));

    let _ = writeln!(html, "<h2>Experiments</h2>\n<table>");
    let _ = writeln!(
        html,
        "<tr><th>File</th><th>SF</th><th>BW</th><th>CR</th><th>Payload (bytes)</th>\
         <th>Messages received</th><th>Delivery rate</th></tr>"
    );
    for row in &report.experiments {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td><td>{:.1}%</td></tr>",
            escape_html(&row.file_name),
            optional(row.spreading_factor),
            optional(row.bandwidth),
            optional(row.coding_rate),
            optional(row.payload_size),
            row.messages_received,
            row.expected_messages,
            row.delivery_rate
        );
    }
    let _ = writeln!(html, "</table>");

    let comparison = &report.comparison;
    if !comparison.cells.is_empty() {
        let _ = writeln!(html, "<h2>Delivery rate by spreading factor and payload size</h2>\n<table>");
        let _ = write!(html, "<tr><th>SF</th>");
        for payload in &comparison.payload_sizes {
            let _ = write!(html, "<th>{} bytes</th>", payload);
        }
        let _ = writeln!(html, "</tr>");

        for row in comparison.cells.chunks(comparison.payload_sizes.len().max(1)) {
            let sf = row.first().map(|c| c.spreading_factor).unwrap_or_default();
            let _ = write!(html, "<tr><td>SF{}</td>", sf);
            for cell in row {
                if cell.present {
                    let _ = write!(html, "<td>{:.1}%</td>", cell.delivery_rate);
                } else {
                    let _ = write!(html, "<td class=\"absent\">n/a</td>");
                }
            }
            let _ = writeln!(html, "</tr>");
        }
        let _ = writeln!(html, "</table>");
    }

    let _ = writeln!(html, "</div>\n</body>\n</html>");
    html
}

/// Generate the HTML summary report
pub fn generate_html_report(report: &DirectoryReport, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_html_report(report))
        .with_context(|| format!("Failed to write HTML report to {}", output_path.display()))?;

    log::info!("HTML report written to {}", output_path.display());
    Ok(())
}

/// Print the figures of one file to stdout
pub fn print_file_summary(summary: &FileSummary) {
    println!("\n=== {} ===", summary.file_name);
    println!(
        "Messages: {}/{} ({:.1}%)",
        summary.messages_received, summary.expected_messages, summary.delivery_rate
    );
    if summary.discarded_lines > 0 {
        println!("Discarded lines: {}", summary.discarded_lines);
    }
    println!(
        "RSSI: mean {:.1} dBm, median {:.1} dBm, min {} dBm, max {} dBm",
        summary.rssi.mean, summary.rssi.median, summary.rssi.min, summary.rssi.max
    );
    println!(
        "SNR:  mean {:.1} dB, median {:.1} dB, min {} dB, max {} dB",
        summary.snr.mean, summary.snr.median, summary.snr.min, summary.snr.max
    );
}

/// Print a summary to stdout
pub fn print_summary(report: &DirectoryReport) {
    println!("\n=== LORAWAN DELIVERY SUMMARY ===\n");
    println!("Data directory: {}", report.metadata.data_dir);
    println!(
        "Files: {} found, {} analyzed, {} skipped",
        report.metadata.files_found, report.metadata.files_analyzed, report.metadata.files_skipped
    );

    if !report.experiments.is_empty() {
        println!();
        for row in &report.experiments {
            println!(
                "  SF{:<3} {:>4} bytes  {:>4}/{}  {:>6.1}%  {}",
                optional(row.spreading_factor),
                optional(row.payload_size),
                row.messages_received,
                row.expected_messages,
                row.delivery_rate,
                row.file_name
            );
        }
    }

    println!();
}
