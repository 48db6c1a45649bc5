//! Core data types for reception log analysis.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Coding rate recorded when the raw field is not purely numeric
pub const DEFAULT_CODING_RATE: u32 = 5;

/// Spreading factor recorded when the datarate label carries no `SF<n>` token
pub const UNKNOWN_SPREADING_FACTOR: u32 = 0;

/// One received message, as extracted from a single log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// 1-based position among the accepted entries of the file
    pub sequence_id: u32,
    /// Timestamp text exactly as logged
    pub time: String,
    /// Parsed timestamp, `None` when the text matched no known format
    pub timestamp: Option<NaiveDateTime>,
    pub rssi: i32,
    pub snr: i32,
    pub spreading_factor: u32,
    pub coding_rate: u32,
    pub datarate_label: String,
    pub node_id: String,
    pub gateway_id: String,
}

/// Why a log line produced no entry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscardReason {
    #[error("insufficient fields ({found} < {required})")]
    InsufficientFields { found: usize, required: usize },

    #[error("missing RSSI/SNR")]
    MissingSignal,
}

/// A discarded line, kept for per-file diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiagnostic {
    pub line_number: usize,
    pub reason: String,
}

/// How the entries of a file ended up ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Every timestamp parsed, entries sorted chronologically
    Timestamp,
    /// At least one timestamp failed, entries kept in sequence order
    Sequence,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Timestamp => write!(f, "timestamp"),
            SortOrder::Sequence => write!(f, "sequence"),
        }
    }
}

/// Radio configuration encoded in an experiment file name.
///
/// These values come from the file name only and are never merged with
/// the per-record spreading factor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub spreading_factor: Option<u32>,
    pub bandwidth: Option<u32>,
    pub coding_rate: Option<u32>,
    pub payload_size: Option<u32>,
    /// Experiment date ("DD-MM-YYYY") when the full naming convention matched
    pub date: Option<String>,
    /// Experiment window ("HHhMM-HHhMM") when the full naming convention matched
    pub time_window: Option<String>,
}

/// Ordered entries of one file plus file-level metadata
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub file_name: String,
    pub experiment: ExperimentConfig,
    pub entries: Vec<MessageEntry>,
    pub sort_order: SortOrder,
    pub discarded: Vec<LineDiagnostic>,
}

impl ParsedLog {
    /// Distinct record-derived spreading factors, ascending
    pub fn spreading_factors(&self) -> Vec<u32> {
        self.entries
            .iter()
            .map(|e| e.spreading_factor)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First and last timestamp of the file.
    ///
    /// Chronological when every timestamp parsed, otherwise the lexical
    /// extremes of the raw text.
    pub fn time_range(&self) -> Option<(String, String)> {
        match self.sort_order {
            SortOrder::Timestamp => {
                let first = self.entries.first()?;
                let last = self.entries.last()?;
                Some((first.time.clone(), last.time.clone()))
            }
            SortOrder::Sequence => {
                let min = self.entries.iter().map(|e| e.time.as_str()).min()?;
                let max = self.entries.iter().map(|e| e.time.as_str()).max()?;
                Some((min.to_string(), max.to_string()))
            }
        }
    }
}

/// Descriptive statistics over one signal column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub mean: f64,
    pub median: f64,
    pub min: i32,
    pub max: i32,
}

/// One point of the rolling delivery-rate series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPoint {
    pub sequence_id: u32,
    pub spreading_factor: u32,
    /// 1-based position of the entry inside its spreading-factor group
    pub group_position: usize,
    /// Entries in the trailing window divided by the full window size, in percent
    pub delivery_rate: f64,
}

/// Everything derived from one experiment file
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub file_name: String,
    /// Filename-derived configuration
    pub experiment: ExperimentConfig,
    /// Record-derived spreading factor of the first entry, used as comparison key
    pub spreading_factor: u32,
    pub spreading_factors: Vec<u32>,
    pub time_range: Option<(String, String)>,
    pub sort_order: SortOrder,
    pub rssi: SignalStats,
    pub snr: SignalStats,
    pub messages_received: usize,
    pub expected_messages: usize,
    /// Received over expected, in percent, never clamped
    pub delivery_rate: f64,
    pub discarded_lines: usize,
    pub rolling_delivery: Vec<DeliveryPoint>,
    pub entries: Vec<MessageEntry>,
}

impl FileSummary {
    /// Payload size used for cross-file grouping, 0 when the name carries none
    pub fn payload_size(&self) -> u32 {
        self.experiment.payload_size.unwrap_or(0)
    }
}

/// One cell of the cross-experiment grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCell {
    pub spreading_factor: u32,
    pub payload_size: u32,
    /// Delivery rate in percent, 0 when no experiment covered the pair
    pub delivery_rate: f64,
    /// Whether an experiment actually covered the pair
    pub present: bool,
}

/// A row of the per-experiment report table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRow {
    pub file_name: String,
    pub spreading_factor: Option<u32>,
    pub bandwidth: Option<u32>,
    pub coding_rate: Option<u32>,
    pub payload_size: Option<u32>,
    pub messages_received: usize,
    pub expected_messages: usize,
    pub delivery_rate: f64,
}

impl From<&FileSummary> for ExperimentRow {
    fn from(summary: &FileSummary) -> Self {
        Self {
            file_name: summary.file_name.clone(),
            spreading_factor: summary.experiment.spreading_factor,
            bandwidth: summary.experiment.bandwidth,
            coding_rate: summary.experiment.coding_rate,
            payload_size: summary.experiment.payload_size,
            messages_received: summary.messages_received,
            expected_messages: summary.expected_messages,
            delivery_rate: summary.delivery_rate,
        }
    }
}
