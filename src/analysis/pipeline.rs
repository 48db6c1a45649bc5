//! File and directory passes.
//!
//! Files are handled one at a time in sorted name order. Any failure is
//! contained to its file: it is logged and the pass moves on.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

use crate::config::AnalysisConfig;

use super::combiner::ComparisonDataset;
use super::error::AnalysisError;
use super::extractor::RecordExtractor;
use super::filename::file_name_of;
use super::json_export::{read_json_messages, write_json_messages};
use super::log_parser::parse_log_file;
use super::metrics::summarize;
use super::report::{self, DirectoryReport, ReportMetadata};
use super::types::*;

/// File name of the directory comparison report
pub const COMPARISON_REPORT: &str = "comparison.json";

/// File name of the HTML summary report
pub const HTML_REPORT: &str = "lorawan_analysis_report.html";

/// Extension of the JSON message format
pub const JSON_EXTENSION: &str = "json";

/// Result of a directory pass
#[derive(Debug, Clone)]
pub struct DirectoryOutcome {
    pub summaries: Vec<FileSummary>,
    pub comparison: ComparisonDataset,
    /// `None` when no file yielded data
    pub report: Option<DirectoryReport>,
    /// Skipped files with the reason
    pub skipped: Vec<(String, String)>,
}

/// Runs the extraction and aggregation engine over files and directories
pub struct Analyzer {
    config: AnalysisConfig,
    extractor: RecordExtractor,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self::with_extractor(config, RecordExtractor::default())
    }

    pub fn with_extractor(config: AnalysisConfig, extractor: RecordExtractor) -> Self {
        Self { config, extractor }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Parse and summarize one file without writing anything
    pub fn analyze_file(&self, path: &Path) -> Result<FileSummary, AnalysisError> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(JSON_EXTENSION));

        let parsed = if self.config.is_log_file(path) {
            parse_log_file(path, &self.extractor)?
        } else if is_json {
            read_json_messages(path)?
        } else {
            return Err(AnalysisError::UnsupportedFile {
                path: path.to_path_buf(),
            });
        };

        summarize(parsed, &self.config)
    }

    /// Analyze one file and write its artifacts.
    ///
    /// Returns `Ok(None)` when the file holds no usable data or cannot be
    /// read; only artifact write failures surface as errors.
    pub fn process_file(&self, path: &Path) -> Result<Option<FileSummary>> {
        let file_name = file_name_of(path);
        log::info!("Processing {}", file_name);

        let hint = ExperimentConfig::from_file_name(&file_name);
        log::info!(
            "  Spreading factor (file name): {}",
            hint.spreading_factor.map_or("n/a".to_string(), |sf| sf.to_string())
        );
        log::info!("  Payload size: {} bytes", hint.payload_size.unwrap_or(0));

        let summary = match self.analyze_file(path) {
            Ok(summary) => summary,
            Err(e) if e.is_empty_file() => {
                log::info!("Skipping {}: {}", file_name, e);
                return Ok(None);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", file_name, e);
                return Ok(None);
            }
        };

        log::info!("  {} valid messages", summary.messages_received);
        log::info!("  Spreading factors: {:?}", summary.spreading_factors);
        if let Some((first, last)) = &summary.time_range {
            log::info!("  Period: {} to {}", first, last);
        }
        if summary.sort_order == SortOrder::Sequence {
            log::warn!("  {} ordered by sequence: timestamps could not be parsed", file_name);
        }

        self.write_file_artifacts(path, &summary)?;
        Ok(Some(summary))
    }

    fn write_file_artifacts(&self, path: &Path, summary: &FileSummary) -> Result<()> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| summary.file_name.clone());

        report::write_file_metrics(summary, &output_dir.join(format!("{}_metrics.json", stem)))?;

        if self.config.export_json {
            let json_path = output_dir.join(JSON_EXTENSION).join(format!("{}.json", stem));
            write_json_messages(&json_path, &summary.entries)?;
        }

        Ok(())
    }

    /// Log files of a directory, sorted by name
    pub fn list_log_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && self.config.is_log_file(p))
            .collect();
        files.sort_by_key(|p| file_name_of(p));
        Ok(files)
    }

    /// Analyze every log file of a directory and build the comparison
    pub fn process_directory(&self, dir: &Path) -> Result<DirectoryOutcome> {
        log::info!("Processing files in {}", dir.display());

        let files = self.list_log_files(dir)?;
        let mut summaries = Vec::new();
        let mut skipped = Vec::new();

        for path in &files {
            match self.process_file(path) {
                Ok(Some(summary)) => summaries.push(summary),
                Ok(None) => skipped.push((file_name_of(path), "no valid data".to_string())),
                Err(e) => {
                    log::warn!("Failed to process {}: {:#}", path.display(), e);
                    skipped.push((file_name_of(path), e.to_string()));
                }
            }
        }

        let comparison = ComparisonDataset::from_summaries(&summaries);

        if summaries.is_empty() {
            log::warn!("No file in {} yielded data, no combined report", dir.display());
            return Ok(DirectoryOutcome {
                summaries,
                comparison,
                report: None,
                skipped,
            });
        }

        let metadata = ReportMetadata {
            analysis_timestamp: chrono::Utc::now().to_rfc3339(),
            data_dir: dir.display().to_string(),
            files_found: files.len(),
            files_analyzed: summaries.len(),
            files_skipped: skipped.len(),
        };
        let directory_report = DirectoryReport::new(metadata, &summaries, &comparison);

        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
        report::generate_json_report(&directory_report, &output_dir.join(COMPARISON_REPORT))?;
        report::generate_html_report(&directory_report, &output_dir.join(HTML_REPORT))?;

        Ok(DirectoryOutcome {
            summaries,
            comparison,
            report: Some(directory_report),
            skipped,
        })
    }
}
