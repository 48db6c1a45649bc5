use clap::Parser;
use color_eyre::eyre::bail;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use lorawan_analyzer::analysis::pipeline::JSON_EXTENSION;
use lorawan_analyzer::analysis::{report, Analyzer};
use lorawan_analyzer::config_loader::{self, ConfigOverrides};

/// Delivery-rate and signal-quality analysis for LoRaWAN gateway logs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file or directory of log files to analyze
    path: PathBuf,

    /// Optional YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for reports (overrides the configuration)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Messages expected per experiment (overrides the configuration)
    #[arg(long)]
    expected: Option<usize>,

    /// Rolling delivery-rate window in messages (overrides the configuration)
    #[arg(long)]
    window: Option<usize>,

    /// Also export parsed messages in the JSON message format
    #[arg(long)]
    export_json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            expected_messages: self.expected,
            window_size: self.window,
            output_dir: self.output.clone(),
            export_json: self.export_json,
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    let config = config_loader::resolve_config(args.config.as_deref(), &args.overrides())?;
    info!("Output directory: {:?}", config.output_dir);

    let analyzer = Analyzer::new(config);
    let extension = analyzer.config().extension().to_string();

    if args.path.is_dir() {
        let outcome = analyzer.process_directory(&args.path)?;
        for summary in &outcome.summaries {
            report::print_file_summary(summary);
        }
        match &outcome.report {
            Some(directory_report) => report::print_summary(directory_report),
            None => println!("\nNo valid data found in {}", args.path.display()),
        }
    } else if args.path.is_file()
        && (analyzer.config().is_log_file(&args.path)
            || args
                .path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(JSON_EXTENSION)))
    {
        match analyzer.process_file(&args.path)? {
            Some(summary) => report::print_file_summary(&summary),
            None => println!("\nNo valid data found in {}", args.path.display()),
        }
    } else {
        bail!(
            "The path must be a .{} file or a directory containing .{} files: {}\n\
             Usage: lorawan-analyzer <PATH>  (e.g. lorawan-analyzer Data/Max/)",
            extension,
            extension,
            args.path.display()
        );
    }

    info!("Analysis complete");
    Ok(())
}
