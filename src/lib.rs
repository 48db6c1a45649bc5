//! # LoRaWAN Analyzer - Delivery-rate analysis for LoRaWAN gateway logs
//!
//! This library turns the reception logs exported by a LoRaWAN gateway into
//! per-experiment radio metrics and a comparison across radio configurations.
//!
//! ## Overview
//!
//! Each experiment sends a fixed number of messages with one radio
//! configuration (spreading factor, bandwidth, coding rate, payload size)
//! and records what the gateway received in a `;`-delimited log file whose
//! name carries the configuration. The library extracts one entry per
//! received message, computes signal statistics and delivery rates per
//! file, and groups the files of a directory by spreading factor and
//! payload size.
//!
//! ## Architecture
//!
//! - `analysis::extractor`: one log line to one message entry, through an
//!   ordered chain of RSSI/SNR resolvers
//! - `analysis::log_parser`: whole-file parsing, sequence numbering, time ordering
//! - `analysis::metrics`: descriptive statistics and delivery rates
//! - `analysis::combiner`: cross-file comparison keyed by (SF, payload size)
//! - `analysis::json_export`: the JSON message format
//! - `analysis::report`: JSON and HTML reports
//! - `analysis::pipeline`: file and directory passes
//! - `config` / `config_loader`: YAML settings and CLI overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lorawan_analyzer::analysis::Analyzer;
//! use lorawan_analyzer::config::AnalysisConfig;
//! use std::path::Path;
//!
//! let analyzer = Analyzer::new(AnalysisConfig::default());
//! let outcome = analyzer.process_directory(Path::new("Data/Max"))?;
//!
//! for sf in &outcome.comparison.spreading_factors {
//!     for payload in &outcome.comparison.payload_sizes {
//!         let cell = outcome.comparison.cell(*sf, *payload);
//!         println!("SF{} {} bytes: {:.1}% (present: {})", sf, payload, cell.delivery_rate, cell.present);
//!     }
//! }
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Line- and file-level problems never abort a run: discarded lines and
//! skipped files are logged through the `log` facade. Typed errors are
//! defined with `thiserror`; I/O orchestration returns
//! `color_eyre::eyre::Result`.

pub mod analysis;
pub mod config;
pub mod config_loader;
