//! File-level parsing of gateway reception logs.
//!
//! Drives the [`RecordExtractor`] over every line after the header, numbers
//! accepted entries densely and orders them by time when every timestamp
//! parses.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};

use super::error::AnalysisError;
use super::extractor::RecordExtractor;
use super::filename::file_name_of;
use super::types::*;

/// Naive formats tried after RFC 3339
const NAIVE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a logged timestamp.
///
/// Offset-carrying timestamps are normalized to UTC.
/// Format examples: "2024-05-14T10:03:12.120Z", "2024-05-14 10:03:12"
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Attach parsed timestamps and order the entries.
///
/// Sorted chronologically only when every timestamp parses; a single failure
/// keeps the whole file in sequence order.
pub fn order_entries(entries: &mut [MessageEntry]) -> SortOrder {
    for entry in entries.iter_mut() {
        entry.timestamp = parse_timestamp(&entry.time);
    }

    if let Some(bad) = entries.iter().find(|e| e.timestamp.is_none()) {
        log::warn!(
            "Unparseable timestamp {:?} (message {}), ordering by sequence",
            bad.time,
            bad.sequence_id
        );
        entries.sort_by_key(|e| e.sequence_id);
        SortOrder::Sequence
    } else {
        // Stable, so equal timestamps keep their sequence order
        entries.sort_by_key(|e| e.timestamp);
        SortOrder::Timestamp
    }
}

/// Parse log lines from any reader.
///
/// The first line is a header and is skipped. Returns
/// [`AnalysisError::NoValidData`] when no line survives extraction.
pub fn parse_log_reader<R: BufRead>(
    reader: R,
    file_name: &str,
    extractor: &RecordExtractor,
) -> Result<ParsedLog, AnalysisError> {
    let experiment = ExperimentConfig::from_file_name(file_name);
    let mut entries: Vec<MessageEntry> = Vec::new();
    let mut discarded = Vec::new();

    // Line numbers are 1-based and count the header
    for (index, line_result) in reader.lines().enumerate().skip(1) {
        let line_number = index + 1;
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                log::warn!("{}: line {} skipped: {}", file_name, line_number, e);
                discarded.push(LineDiagnostic {
                    line_number,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match extractor.extract(&line, &experiment) {
            Ok(record) => {
                let sequence_id = entries.len() as u32 + 1;
                entries.push(record.into_entry(sequence_id));
            }
            Err(reason) => {
                log::warn!("{}: line {} skipped: {}", file_name, line_number, reason);
                discarded.push(LineDiagnostic {
                    line_number,
                    reason: reason.to_string(),
                });
            }
        }
    }

    if entries.is_empty() {
        return Err(AnalysisError::NoValidData {
            file: file_name.to_string(),
        });
    }

    let sort_order = order_entries(&mut entries);

    Ok(ParsedLog {
        file_name: file_name.to_string(),
        experiment,
        entries,
        sort_order,
        discarded,
    })
}

/// Parse a single log file
pub fn parse_log_file(path: &Path, extractor: &RecordExtractor) -> Result<ParsedLog, AnalysisError> {
    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::with_capacity(64 * 1024, file);

    let parsed = parse_log_reader(reader, &file_name_of(path), extractor)?;
    log::debug!(
        "Parsed {}: {} entries, {} lines discarded",
        parsed.file_name,
        parsed.entries.len(),
        parsed.discarded.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "\"id;gateway;node;snr;rssi;cr;datarate;time;data\"";

    fn parse(body: &str) -> Result<ParsedLog, AnalysisError> {
        let text = format!("{}\n{}", HEADER, body);
        parse_log_reader(Cursor::new(text), "SF7_BW125_CR5_20.csv", &RecordExtractor::default())
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-05-14T10:03:12.120Z").unwrap();
        assert_eq!(rfc.to_string(), "2024-05-14 10:03:12.120");

        let offset = parse_timestamp("2024-05-14T12:00:00+02:00").unwrap();
        assert_eq!(offset.to_string(), "2024-05-14 10:00:00");

        assert!(parse_timestamp("2024-05-14 10:03:12").is_some());
        assert!(parse_timestamp("14/05/2024 10:03:12").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_dense_sequence_ids() {
        let body = "\
1;gw;n;5;-90;5;SF7BW125;2024-05-14T10:00:00Z
short;line
2;gw;n;x;y;5;SF7BW125;2024-05-14T10:00:10Z
3;gw;n;6;-91;5;SF7BW125;2024-05-14T10:00:20Z

4;gw;n;7;-92;5;SF7BW125;2024-05-14T10:00:30Z
";
        let parsed = parse(body).unwrap();
        let ids: Vec<u32> = parsed.entries.iter().map(|e| e.sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(parsed.discarded.len(), 2);
        assert_eq!(parsed.discarded[0].line_number, 3);
        assert_eq!(parsed.discarded[1].line_number, 4);
        assert_eq!(parsed.discarded[1].reason, "missing RSSI/SNR");
        assert_eq!(parsed.sort_order, SortOrder::Timestamp);
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let body = "\
1;gw;n;5;-90;5;SF7BW125;2024-05-14T10:00:30Z
2;gw;n;6;-91;5;SF7BW125;2024-05-14T10:00:10Z
3;gw;n;7;-92;5;SF7BW125;2024-05-14T10:00:20Z
";
        let parsed = parse(body).unwrap();
        let ids: Vec<u32> = parsed.entries.iter().map(|e| e.sequence_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(parsed.entries.iter().all(|e| e.timestamp.is_some()));
        assert_eq!(
            parsed.time_range(),
            Some(("2024-05-14T10:00:10Z".to_string(), "2024-05-14T10:00:30Z".to_string()))
        );
    }

    #[test]
    fn test_one_bad_timestamp_falls_back_to_sequence() {
        let body = "\
1;gw;n;5;-90;5;SF7BW125;2024-05-14T10:00:30Z
2;gw;n;6;-91;5;SF7BW125;not a time
3;gw;n;7;-92;5;SF7BW125;2024-05-14T10:00:20Z
";
        let parsed = parse(body).unwrap();
        let ids: Vec<u32> = parsed.entries.iter().map(|e| e.sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(parsed.sort_order, SortOrder::Sequence);
    }

    #[test]
    fn test_header_only_is_no_data() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, AnalysisError::NoValidData { .. }));
    }

    #[test]
    fn test_all_lines_invalid_is_no_data() {
        let err = parse("a;b;c\n1;gw;n;x;y;5;SF7;t\n").unwrap_err();
        assert!(matches!(err, AnalysisError::NoValidData { .. }));
    }

    #[test]
    fn test_experiment_from_file_name() {
        let parsed = parse("1;gw;n;5;-90;5;SF9BW125;2024-05-14T10:00:00Z\n").unwrap();
        assert_eq!(parsed.experiment.spreading_factor, Some(7));
        assert_eq!(parsed.experiment.payload_size, Some(20));
        assert_eq!(parsed.spreading_factors(), vec![9]);
    }
}
