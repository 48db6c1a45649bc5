//! JSON message format.
//!
//! One object per entry, shaped like the document-store exports the
//! plotting tools consume:
//!
//! ```json
//! {"_id": {"$oid": "1"}, "snr": 7, "rssi": -97, "cr": 5,
//!  "datarate": "SF7BW125", "time": "2024-05-14T10:00:00Z",
//!  "gateway_eui": "gw-01", "node_eui": "node-a"}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::AnalysisError;
use super::extractor::parse_spreading_factor;
use super::filename::file_name_of;
use super::log_parser::order_entries;
use super::types::*;

/// Opaque document id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectId {
    #[serde(rename = "$oid")]
    pub oid: String,
}

/// One message in the JSON format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub snr: i32,
    pub rssi: i32,
    pub cr: u32,
    pub datarate: String,
    pub time: String,
    pub gateway_eui: String,
    pub node_eui: String,
}

impl From<&MessageEntry> for JsonMessage {
    fn from(entry: &MessageEntry) -> Self {
        Self {
            id: ObjectId {
                oid: entry.sequence_id.to_string(),
            },
            snr: entry.snr,
            rssi: entry.rssi,
            cr: entry.coding_rate,
            datarate: entry.datarate_label.clone(),
            time: entry.time.clone(),
            gateway_eui: entry.gateway_id.clone(),
            node_eui: entry.node_id.clone(),
        }
    }
}

/// Map entries 1:1 to JSON messages, in sequence order
pub fn to_json_messages(entries: &[MessageEntry]) -> Vec<JsonMessage> {
    let mut messages: Vec<JsonMessage> = entries.iter().map(JsonMessage::from).collect();
    messages.sort_by_key(|m| m.id.oid.parse::<u64>().unwrap_or(u64::MAX));
    messages
}

/// Write entries as a pretty-printed JSON array, creating parent directories
pub fn write_json_messages(path: &Path, entries: &[MessageEntry]) -> Result<(), AnalysisError> {
    let io_err = |source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(&to_json_messages(entries)).map_err(|source| {
        AnalysisError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json).map_err(io_err)?;

    log::info!("{} messages written to {}", entries.len(), path.display());
    Ok(())
}

/// Load a JSON message file as an ordered, densely numbered log.
///
/// Spreading factors are re-derived from `datarate`; the stored ids are
/// opaque and only used to keep the document order stable.
pub fn read_json_messages(path: &Path) -> Result<ParsedLog, AnalysisError> {
    let file_name = file_name_of(path);
    let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let messages: Vec<JsonMessage> =
        serde_json::from_str(&content).map_err(|source| AnalysisError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if messages.is_empty() {
        return Err(AnalysisError::NoValidData { file: file_name });
    }

    let mut entries: Vec<MessageEntry> = messages
        .into_iter()
        .enumerate()
        .map(|(i, m)| MessageEntry {
            sequence_id: i as u32 + 1,
            spreading_factor: parse_spreading_factor(&m.datarate),
            time: m.time,
            timestamp: None,
            rssi: m.rssi,
            snr: m.snr,
            coding_rate: m.cr,
            datarate_label: m.datarate,
            node_id: m.node_eui,
            gateway_id: m.gateway_eui,
        })
        .collect();

    let sort_order = order_entries(&mut entries);

    Ok(ParsedLog {
        experiment: ExperimentConfig::from_file_name(&file_name),
        file_name,
        entries,
        sort_order,
        discarded: Vec::new(),
    })
}
