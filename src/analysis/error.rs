//! File-level errors of the analysis pipeline.
//!
//! None of these abort a directory pass: the caller logs them and moves on
//! to the next file.

use std::path::PathBuf;

/// Errors that can occur while analyzing one log file
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No valid data found in {file}")]
    NoValidData { file: String },

    #[error("Invalid message JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported file type: {}", path.display())]
    UnsupportedFile { path: PathBuf },
}

impl AnalysisError {
    /// Whether the file was readable but simply held nothing usable
    pub fn is_empty_file(&self) -> bool {
        matches!(self, AnalysisError::NoValidData { .. })
    }
}
