//! Reception log analysis for LoRaWAN experiments.
//!
//! This module turns gateway reception logs into per-experiment
//! signal-quality and delivery-rate metrics, and folds them into a
//! cross-experiment comparison.

pub mod types;
pub mod error;
pub mod filename;
pub mod extractor;
pub mod log_parser;
pub mod metrics;
pub mod combiner;
pub mod json_export;
pub mod report;
pub mod pipeline;

pub use types::*;
pub use error::AnalysisError;
pub use extractor::RecordExtractor;
pub use log_parser::{parse_log_file, parse_log_reader};
pub use metrics::summarize;
pub use combiner::ComparisonDataset;
pub use pipeline::{Analyzer, DirectoryOutcome};
pub use report::{generate_html_report, generate_json_report};
