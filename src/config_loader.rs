use crate::config::AnalysisConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load and parse analysis settings from a YAML file
pub fn load_config(config_path: &Path) -> Result<AnalysisConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: AnalysisConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub expected_messages: Option<usize>,
    pub window_size: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub export_json: bool,
}

/// Apply CLI overrides to a configuration
pub fn apply_overrides(config: &mut AnalysisConfig, overrides: &ConfigOverrides) -> Result<()> {
    if let Some(expected) = overrides.expected_messages {
        info!("Expected message count overridden: {}", expected);
        config.expected_messages = expected;
    }

    if let Some(window) = overrides.window_size {
        info!("Rolling window overridden: {} messages", window);
        config.window_size = window;
    }

    if let Some(ref output_dir) = overrides.output_dir {
        config.output_dir = output_dir.clone();
    }

    if overrides.export_json {
        config.export_json = true;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

/// Configuration from an optional file, with CLI overrides applied
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<AnalysisConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    apply_overrides(&mut config, overrides)?;
    Ok(config)
}
