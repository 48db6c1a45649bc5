use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Analysis settings, loadable from YAML with every field optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Messages each experiment was expected to deliver (default: 200)
    pub expected_messages: usize,
    /// Window of the rolling delivery rate, in messages (default: 10)
    pub window_size: usize,
    /// Extension of primary-format log files, without the dot (default: "csv")
    pub log_extension: String,
    /// Directory receiving reports (default: "graphs")
    pub output_dir: PathBuf,
    /// Also write each parsed file in the JSON message format
    pub export_json: bool,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid expected message count: {0}")]
    InvalidExpected(String),
    #[error("Invalid window size: {0}")]
    InvalidWindow(String),
    #[error("Invalid log extension: {0}")]
    InvalidExtension(String),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            expected_messages: 200,
            window_size: 10,
            log_extension: "csv".to_string(),
            output_dir: PathBuf::from("graphs"),
            export_json: false,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.expected_messages == 0 {
            return Err(ValidationError::InvalidExpected(
                "expected_messages must be at least 1".to_string(),
            ));
        }

        if self.window_size == 0 {
            return Err(ValidationError::InvalidWindow(
                "window_size must be at least 1".to_string(),
            ));
        }

        let ext = self.log_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(ValidationError::InvalidExtension(format!(
                "{:?} is not a file extension",
                self.log_extension
            )));
        }

        Ok(())
    }

    /// Extension without a leading dot
    pub fn extension(&self) -> &str {
        self.log_extension.trim_start_matches('.')
    }

    /// Whether a path carries the configured log extension (case-insensitive)
    pub fn is_log_file(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }
}
