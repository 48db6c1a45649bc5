//! Record extraction for gateway reception logs.
//!
//! Turns one `;`-delimited log line into a [`MessageEntry`]. RSSI and SNR are
//! resolved through an ordered chain of [`SignalResolver`]s: the fixed field
//! positions first, then `"RSSI": <n>` / `"SNR": <n>` pairs embedded in the
//! trailing payload text.

use std::sync::LazyLock;

use regex::Regex;

use super::types::*;

/// Field separator of the primary log format
pub const FIELD_DELIMITER: char = ';';

/// Minimum number of fields for a line to be considered at all
pub const MIN_FIELDS: usize = 8;

/// Fixed field positions of the primary log format
pub mod field {
    pub const GATEWAY_ID: usize = 1;
    pub const NODE_ID: usize = 2;
    pub const SNR: usize = 3;
    pub const RSSI: usize = 4;
    pub const CODING_RATE: usize = 5;
    pub const DATARATE: usize = 6;
    pub const TIME: usize = 7;
    /// First field of the optional payload segment
    pub const PAYLOAD: usize = 8;
}

/// Compiled regex patterns for record extraction
pub struct RecordPatterns {
    /// Match: "SF7BW125" -> 7
    pub spreading_factor: Regex,
    /// Match: `"RSSI": -97` (doubled CSV quotes tolerated)
    pub embedded_rssi: Regex,
    /// Match: `"SNR": 7`
    pub embedded_snr: Regex,
}

impl RecordPatterns {
    pub fn new() -> Self {
        Self {
            spreading_factor: Regex::new(r"SF(\d+)").expect("Invalid spreading_factor regex"),
            embedded_rssi: Regex::new(r#""+RSSI"+\s*:\s*(-?\d+)"#).expect("Invalid embedded_rssi regex"),
            embedded_snr: Regex::new(r#""+SNR"+\s*:\s*(-?\d+)"#).expect("Invalid embedded_snr regex"),
        }
    }
}

impl Default for RecordPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<RecordPatterns> = LazyLock::new(RecordPatterns::new);

/// A log line split into fields. Only lives during extraction.
#[derive(Debug, Clone)]
pub struct RawRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    /// Strip surrounding whitespace and quotes, then split on the delimiter
    pub fn split(line: &'a str) -> Result<Self, DiscardReason> {
        let fields: Vec<&str> = line
            .trim()
            .trim_matches('"')
            .split(FIELD_DELIMITER)
            .collect();

        if fields.len() < MIN_FIELDS {
            return Err(DiscardReason::InsufficientFields {
                found: fields.len(),
                required: MIN_FIELDS,
            });
        }

        Ok(Self { fields })
    }

    /// Field at `index`, empty when out of range
    pub fn field(&self, index: usize) -> &'a str {
        self.fields.get(index).copied().unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every field past the fixed schema, rejoined with the delimiter
    pub fn payload(&self) -> String {
        self.fields
            .get(field::PAYLOAD..)
            .map(|rest| rest.join(";"))
            .unwrap_or_default()
    }
}

/// Signal values carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Rssi,
    Snr,
}

impl Signal {
    /// Fixed field position of the signal
    pub fn position(self) -> usize {
        match self {
            Signal::Rssi => field::RSSI,
            Signal::Snr => field::SNR,
        }
    }

    fn embedded_pattern(self) -> &'static Regex {
        match self {
            Signal::Rssi => &PATTERNS.embedded_rssi,
            Signal::Snr => &PATTERNS.embedded_snr,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Rssi => write!(f, "RSSI"),
            Signal::Snr => write!(f, "SNR"),
        }
    }
}

/// One strategy for locating a signal value inside a record
pub trait SignalResolver: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// The value, or `None` when this strategy cannot find it
    fn resolve(&self, record: &RawRecord<'_>, signal: Signal) -> Option<i32>;
}

/// Reads the signal from its fixed field position
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPositionResolver;

impl SignalResolver for FixedPositionResolver {
    fn name(&self) -> &'static str {
        "fixed-position"
    }

    fn resolve(&self, record: &RawRecord<'_>, signal: Signal) -> Option<i32> {
        parse_signed_field(record.field(signal.position()))
    }
}

/// Searches the payload segment for a `"KEY": <int>` pair
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedPayloadResolver;

impl SignalResolver for EmbeddedPayloadResolver {
    fn name(&self) -> &'static str {
        "embedded-payload"
    }

    fn resolve(&self, record: &RawRecord<'_>, signal: Signal) -> Option<i32> {
        let payload = record.payload();
        signal
            .embedded_pattern()
            .captures(&payload)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Accept a field as a signed integer only when, after one leading sign,
/// every remaining character is a digit.
pub fn parse_signed_field(s: &str) -> Option<i32> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Coding rate of a record, [`DEFAULT_CODING_RATE`] unless the field is purely numeric
pub fn parse_coding_rate(s: &str) -> u32 {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_CODING_RATE;
    }
    s.parse().unwrap_or(DEFAULT_CODING_RATE)
}

/// Spreading factor from a datarate label, [`UNKNOWN_SPREADING_FACTOR`] when absent
pub fn parse_spreading_factor(datarate: &str) -> u32 {
    PATTERNS
        .spreading_factor
        .captures(datarate)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(UNKNOWN_SPREADING_FACTOR)
}

/// A validated record still waiting for its sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub time: String,
    pub rssi: i32,
    pub snr: i32,
    pub spreading_factor: u32,
    pub coding_rate: u32,
    pub datarate_label: String,
    pub node_id: String,
    pub gateway_id: String,
}

impl ExtractedRecord {
    pub fn into_entry(self, sequence_id: u32) -> MessageEntry {
        MessageEntry {
            sequence_id,
            time: self.time,
            timestamp: None,
            rssi: self.rssi,
            snr: self.snr,
            spreading_factor: self.spreading_factor,
            coding_rate: self.coding_rate,
            datarate_label: self.datarate_label,
            node_id: self.node_id,
            gateway_id: self.gateway_id,
        }
    }
}

/// Extracts message records through a prioritized resolver chain
pub struct RecordExtractor {
    resolvers: Vec<Box<dyn SignalResolver>>,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(FixedPositionResolver),
            Box::new(EmbeddedPayloadResolver),
        ])
    }
}

impl RecordExtractor {
    /// Build an extractor that consults `resolvers` in order
    pub fn new(resolvers: Vec<Box<dyn SignalResolver>>) -> Self {
        Self { resolvers }
    }

    /// Names of the configured resolvers, in priority order
    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// First value any resolver finds for `signal`
    fn resolve(&self, record: &RawRecord<'_>, signal: Signal) -> Option<i32> {
        self.resolvers.iter().find_map(|resolver| {
            let value = resolver.resolve(record, signal)?;
            log::trace!("{} resolved by {}: {}", signal, resolver.name(), value);
            Some(value)
        })
    }

    /// Extract one record from a raw line.
    ///
    /// `hint` is the configuration parsed from the file name. The record's
    /// own datarate label always decides the entry's spreading factor.
    pub fn extract(
        &self,
        line: &str,
        hint: &ExperimentConfig,
    ) -> Result<ExtractedRecord, DiscardReason> {
        let record = RawRecord::split(line)?;

        let rssi = self.resolve(&record, Signal::Rssi);
        let snr = self.resolve(&record, Signal::Snr);
        let (rssi, snr) = match (rssi, snr) {
            (Some(rssi), Some(snr)) => (rssi, snr),
            _ => return Err(DiscardReason::MissingSignal),
        };

        let datarate = record.field(field::DATARATE);
        let spreading_factor = parse_spreading_factor(datarate);
        if let Some(expected) = hint.spreading_factor {
            if expected != spreading_factor {
                log::debug!(
                    "Record datarate {:?} gives SF{}, file name says SF{}",
                    datarate,
                    spreading_factor,
                    expected
                );
            }
        }

        Ok(ExtractedRecord {
            time: record.field(field::TIME).to_string(),
            rssi,
            snr,
            spreading_factor,
            coding_rate: parse_coding_rate(record.field(field::CODING_RATE)),
            datarate_label: datarate.to_string(),
            node_id: record.field(field::NODE_ID).to_string(),
            gateway_id: record.field(field::GATEWAY_ID).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "1;gw-01;node-a;7;-97;5;SF7BW125;2024-05-14T10:00:00Z";

    fn extract(line: &str) -> Result<ExtractedRecord, DiscardReason> {
        RecordExtractor::default().extract(line, &ExperimentConfig::default())
    }

    #[test]
    fn test_fixed_positions() {
        let rec = extract(LINE).unwrap();
        assert_eq!(rec.gateway_id, "gw-01");
        assert_eq!(rec.node_id, "node-a");
        assert_eq!(rec.snr, 7);
        assert_eq!(rec.rssi, -97);
        assert_eq!(rec.coding_rate, 5);
        assert_eq!(rec.datarate_label, "SF7BW125");
        assert_eq!(rec.spreading_factor, 7);
        assert_eq!(rec.time, "2024-05-14T10:00:00Z");
    }

    #[test]
    fn test_quoted_line() {
        let rec = extract(&format!("\"{}\"", LINE)).unwrap();
        assert_eq!(rec.gateway_id, "gw-01");
        assert_eq!(rec.time, "2024-05-14T10:00:00Z");
    }

    #[test]
    fn test_insufficient_fields() {
        let err = extract("1;gw;node;7;-97;5;SF7BW125").unwrap_err();
        assert_eq!(err, DiscardReason::InsufficientFields { found: 7, required: 8 });
    }

    #[test]
    fn test_payload_fallback() {
        let line = r#"1;gw;node;;n/a;5;SF9BW125;2024-05-14T10:00:00Z;{"RSSI": -112, "SNR": -3}"#;
        let rec = extract(line).unwrap();
        assert_eq!(rec.rssi, -112);
        assert_eq!(rec.snr, -3);
        assert_eq!(rec.spreading_factor, 9);
    }

    #[test]
    fn test_payload_split_across_fields() {
        let line = r#"1;gw;node;x;y;5;SF12BW125;t;{"RSSI": -120;"SNR": -9}"#;
        let rec = extract(line).unwrap();
        assert_eq!(rec.rssi, -120);
        assert_eq!(rec.snr, -9);
    }

    #[test]
    fn test_fixed_position_wins_over_payload() {
        let line = r#"1;gw;node;4;bad;5;SF7BW125;t;{"RSSI": -50, "SNR": 99}"#;
        let rec = extract(line).unwrap();
        assert_eq!(rec.snr, 4);
        assert_eq!(rec.rssi, -50);
    }

    #[test]
    fn test_doubled_quotes_in_payload() {
        let line = r#"1;gw;node;x;y;5;SF7BW125;t;{""RSSI"": -101, ""SNR"": 2}"#;
        let rec = extract(line).unwrap();
        assert_eq!(rec.rssi, -101);
        assert_eq!(rec.snr, 2);
    }

    #[test]
    fn test_missing_signal() {
        let line = r#"1;gw;node;x;y;5;SF7BW125;t;{"RSSI": -101}"#;
        assert_eq!(extract(line).unwrap_err(), DiscardReason::MissingSignal);
    }

    #[test]
    fn test_signed_field_validation() {
        assert_eq!(parse_signed_field("-97"), Some(-97));
        assert_eq!(parse_signed_field("12"), Some(12));
        assert_eq!(parse_signed_field("+3"), Some(3));
        assert_eq!(parse_signed_field("-"), None);
        assert_eq!(parse_signed_field(""), None);
        assert_eq!(parse_signed_field("--5"), None);
        assert_eq!(parse_signed_field("-9.5"), None);
        assert_eq!(parse_signed_field(" 5"), None);
    }

    #[test]
    fn test_coding_rate_sentinel() {
        assert_eq!(parse_coding_rate("7"), 7);
        assert_eq!(parse_coding_rate("4/5"), DEFAULT_CODING_RATE);
        assert_eq!(parse_coding_rate(""), DEFAULT_CODING_RATE);
        assert_eq!(parse_coding_rate("-1"), DEFAULT_CODING_RATE);
    }

    #[test]
    fn test_spreading_factor_default() {
        assert_eq!(parse_spreading_factor("SF12BW125"), 12);
        assert_eq!(parse_spreading_factor("FSK"), UNKNOWN_SPREADING_FACTOR);
        assert_eq!(parse_spreading_factor(""), UNKNOWN_SPREADING_FACTOR);
    }

    #[test]
    fn test_record_sf_ignores_hint() {
        let hint = ExperimentConfig {
            spreading_factor: Some(12),
            ..Default::default()
        };
        let rec = RecordExtractor::default().extract(LINE, &hint).unwrap();
        assert_eq!(rec.spreading_factor, 7);
    }

    #[test]
    fn test_custom_resolver_chain() {
        let extractor = RecordExtractor::new(vec![Box::new(EmbeddedPayloadResolver)]);
        assert_eq!(extractor.resolver_names(), vec!["embedded-payload"]);
        // Valid fixed fields are ignored when only the payload resolver is configured
        assert_eq!(
            extractor.extract(LINE, &ExperimentConfig::default()).unwrap_err(),
            DiscardReason::MissingSignal
        );
    }

    #[test]
    fn test_into_entry() {
        let entry = extract(LINE).unwrap().into_entry(3);
        assert_eq!(entry.sequence_id, 3);
        assert!(entry.timestamp.is_none());
    }
}
