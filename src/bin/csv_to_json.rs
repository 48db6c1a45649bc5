//! Converts gateway reception logs to the JSON message format.
//!
//! A single file is written next to its source; a directory is converted
//! into a `json/` sub-directory.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{bail, Result};

use lorawan_analyzer::analysis::extractor::RecordExtractor;
use lorawan_analyzer::analysis::json_export::write_json_messages;
use lorawan_analyzer::analysis::log_parser::parse_log_file;
use lorawan_analyzer::config::AnalysisConfig;

#[derive(Parser)]
#[command(name = "csv-to-json")]
#[command(about = "Convert LoRaWAN reception logs to the JSON message format")]
#[command(version)]
struct Cli {
    /// Log file or directory of log files
    path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Convert one file, `false` when it held nothing to convert
fn convert_file(source: &Path, target: &Path, extractor: &RecordExtractor) -> Result<bool> {
    let parsed = match parse_log_file(source, extractor) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Skipping {}: {}", source.display(), e);
            return Ok(false);
        }
    };

    write_json_messages(target, &parsed.entries)?;
    log::info!(
        "Converted {} -> {} ({} messages)",
        source.display(),
        target.display(),
        parsed.entries.len()
    );
    Ok(true)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let config = AnalysisConfig::default();
    let extractor = RecordExtractor::default();

    if cli.path.is_dir() {
        let analyzer = lorawan_analyzer::analysis::Analyzer::new(config);
        let json_dir = cli.path.join("json");
        let files = analyzer.list_log_files(&cli.path)?;
        let mut converted = 0;

        for source in &files {
            let Some(stem) = source.file_stem() else {
                continue;
            };
            let target = json_dir.join(format!("{}.json", stem.to_string_lossy()));
            match convert_file(source, &target, &extractor) {
                Ok(true) => converted += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Failed to convert {}: {:#}", source.display(), e),
            }
        }

        log::info!("Converted {} of {} files into {}", converted, files.len(), json_dir.display());
    } else if cli.path.is_file() && config.is_log_file(&cli.path) {
        let target = cli.path.with_extension("json");
        convert_file(&cli.path, &target, &extractor)?;
    } else {
        bail!(
            "The path must be a .csv file or a directory containing .csv files: {}",
            cli.path.display()
        );
    }

    Ok(())
}
