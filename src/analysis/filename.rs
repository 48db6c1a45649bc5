//! Experiment metadata carried by log file names.
//!
//! Files follow the convention
//! `received_data_experience-DD-MM-YYYY_HHhMM-HHhMM_SF<n>_BW<n>_CR<n>_<payload>.csv`,
//! but every token is looked up independently so partially conforming names
//! still yield whatever they carry.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::types::ExperimentConfig;

/// Compiled regex patterns for file name tokens
pub struct FileNamePatterns {
    /// Match: "SF7", "SF12"
    pub spreading_factor: Regex,
    /// Match: "BW125"
    pub bandwidth: Regex,
    /// Match: "CR5"
    pub coding_rate: Regex,
    /// Match: trailing "_20.csv"
    pub payload_size: Regex,
    /// Match: "experience-14-05-2024_10h00-11h30_"
    pub experiment_window: Regex,
}

impl FileNamePatterns {
    pub fn new() -> Self {
        Self {
            spreading_factor: Regex::new(r"SF(\d+)").expect("Invalid spreading_factor regex"),
            bandwidth: Regex::new(r"BW(\d+)").expect("Invalid bandwidth regex"),
            coding_rate: Regex::new(r"CR(\d+)").expect("Invalid coding_rate regex"),
            payload_size: Regex::new(r"_(\d+)\.[A-Za-z0-9]+$").expect("Invalid payload_size regex"),
            experiment_window: Regex::new(
                r"experience-(\d{2}-\d{2}-\d{4})_(\d{2}h\d{2}-\d{2}h\d{2})_",
            )
            .expect("Invalid experiment_window regex"),
        }
    }
}

impl Default for FileNamePatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static FILE_NAME_PATTERNS: LazyLock<FileNamePatterns> = LazyLock::new(FileNamePatterns::new);

fn capture_u32(pattern: &Regex, s: &str) -> Option<u32> {
    pattern
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl ExperimentConfig {
    /// Extract the radio configuration from a bare file name
    pub fn from_file_name(file_name: &str) -> Self {
        let patterns = &*FILE_NAME_PATTERNS;
        let window = patterns.experiment_window.captures(file_name);

        Self {
            spreading_factor: capture_u32(&patterns.spreading_factor, file_name),
            bandwidth: capture_u32(&patterns.bandwidth, file_name),
            coding_rate: capture_u32(&patterns.coding_rate, file_name),
            payload_size: capture_u32(&patterns.payload_size, file_name),
            date: window
                .as_ref()
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
            time_window: window
                .as_ref()
                .and_then(|c| c.get(2))
                .map(|m| m.as_str().to_string()),
        }
    }

    /// Extract the radio configuration from the last component of a path
    pub fn from_path(path: &Path) -> Self {
        Self::from_file_name(&file_name_of(path))
    }
}

/// Last path component as an owned string, empty when there is none
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_convention() {
        let cfg = ExperimentConfig::from_file_name(
            "received_data_experience-14-05-2024_10h00-11h30_SF7_BW125_CR5_20.csv",
        );
        assert_eq!(cfg.spreading_factor, Some(7));
        assert_eq!(cfg.bandwidth, Some(125));
        assert_eq!(cfg.coding_rate, Some(5));
        assert_eq!(cfg.payload_size, Some(20));
        assert_eq!(cfg.date.as_deref(), Some("14-05-2024"));
        assert_eq!(cfg.time_window.as_deref(), Some("10h00-11h30"));
    }

    #[test]
    fn test_partial_name() {
        let cfg = ExperimentConfig::from_file_name("capture_SF12_80.csv");
        assert_eq!(cfg.spreading_factor, Some(12));
        assert_eq!(cfg.bandwidth, None);
        assert_eq!(cfg.coding_rate, None);
        assert_eq!(cfg.payload_size, Some(80));
        assert!(cfg.date.is_none());
    }

    #[test]
    fn test_payload_requires_trailing_token() {
        let cfg = ExperimentConfig::from_file_name("SF9_50_run.csv");
        assert_eq!(cfg.spreading_factor, Some(9));
        assert_eq!(cfg.payload_size, None);
    }

    #[test]
    fn test_from_path_uses_file_name_only() {
        let cfg = ExperimentConfig::from_path(Path::new("/data/SF99_dir/SF7_BW250_50.csv"));
        assert_eq!(cfg.spreading_factor, Some(7));
        assert_eq!(cfg.bandwidth, Some(250));
        assert_eq!(cfg.payload_size, Some(50));
    }
}
