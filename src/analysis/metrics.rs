//! Per-file metrics: descriptive signal statistics and delivery rates.
//!
//! The rolling delivery rate always divides by the full window size, so the
//! first `window - 1` points of every spreading-factor group read below 100%
//! even without loss. It is a smoothed availability figure, not a cumulative
//! "delivered so far" rate.

use std::collections::HashMap;

use crate::config::AnalysisConfig;

use super::error::AnalysisError;
use super::types::*;

/// Calculate mean of a slice
fn mean(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Calculate median of a slice
fn median(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Mean, median, min and max of a signal column, `None` when empty
pub fn signal_stats(values: &[i32]) -> Option<SignalStats> {
    let min = *values.iter().min()?;
    let max = *values.iter().max()?;
    Some(SignalStats {
        mean: mean(values),
        median: median(values),
        min,
        max,
    })
}

/// Received over expected, in percent. Not clamped: more messages than
/// expected read above 100%.
pub fn delivery_rate(received: usize, expected: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    received as f64 * 100.0 / expected as f64
}

/// Rolling delivery rate per spreading-factor group.
///
/// Entries are visited in their current order. Within a group, the point
/// for the k-th entry counts the entries in the trailing window of
/// `window_size` ending at it (min(k, window_size), since every entry in the
/// group is present) and divides by `window_size`.
pub fn rolling_delivery_rate(entries: &[MessageEntry], window_size: usize) -> Vec<DeliveryPoint> {
    let mut seen: HashMap<u32, usize> = HashMap::new();

    entries
        .iter()
        .map(|entry| {
            let position = seen.entry(entry.spreading_factor).or_insert(0);
            *position += 1;

            let in_window = (*position).min(window_size);
            DeliveryPoint {
                sequence_id: entry.sequence_id,
                spreading_factor: entry.spreading_factor,
                group_position: *position,
                delivery_rate: delivery_rate(in_window, window_size),
            }
        })
        .collect()
}

/// Build the summary of one parsed file
pub fn summarize(parsed: ParsedLog, config: &AnalysisConfig) -> Result<FileSummary, AnalysisError> {
    let no_data = || AnalysisError::NoValidData {
        file: parsed.file_name.clone(),
    };

    let rssi_values: Vec<i32> = parsed.entries.iter().map(|e| e.rssi).collect();
    let snr_values: Vec<i32> = parsed.entries.iter().map(|e| e.snr).collect();
    let rssi = signal_stats(&rssi_values).ok_or_else(no_data)?;
    let snr = signal_stats(&snr_values).ok_or_else(no_data)?;

    let spreading_factor = parsed
        .entries
        .first()
        .map(|e| e.spreading_factor)
        .unwrap_or(UNKNOWN_SPREADING_FACTOR);
    let messages_received = parsed.entries.len();

    Ok(FileSummary {
        spreading_factors: parsed.spreading_factors(),
        time_range: parsed.time_range(),
        rolling_delivery: rolling_delivery_rate(&parsed.entries, config.window_size),
        spreading_factor,
        sort_order: parsed.sort_order,
        rssi,
        snr,
        messages_received,
        expected_messages: config.expected_messages,
        delivery_rate: delivery_rate(messages_received, config.expected_messages),
        discarded_lines: parsed.discarded.len(),
        file_name: parsed.file_name,
        experiment: parsed.experiment,
        entries: parsed.entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sequence_id: u32, sf: u32, rssi: i32, snr: i32) -> MessageEntry {
        MessageEntry {
            sequence_id,
            time: String::new(),
            timestamp: None,
            rssi,
            snr,
            spreading_factor: sf,
            coding_rate: DEFAULT_CODING_RATE,
            datarate_label: format!("SF{}BW125", sf),
            node_id: "node".to_string(),
            gateway_id: "gw".to_string(),
        }
    }

    fn parsed(entries: Vec<MessageEntry>) -> ParsedLog {
        ParsedLog {
            file_name: "SF7_BW125_CR5_20.csv".to_string(),
            experiment: ExperimentConfig::from_file_name("SF7_BW125_CR5_20.csv"),
            entries,
            sort_order: SortOrder::Sequence,
            discarded: Vec::new(),
        }
    }

    #[test]
    fn test_signal_stats() {
        let stats = signal_stats(&[-110, -100, -90]).unwrap();
        assert!((stats.mean - -100.0).abs() < 1e-9);
        assert!((stats.median - -100.0).abs() < 1e-9);
        assert_eq!(stats.min, -110);
        assert_eq!(stats.max, -90);
    }

    #[test]
    fn test_median_even_count() {
        let stats = signal_stats(&[4, 1, 3, 2]).unwrap();
        assert!((stats.median - 2.5).abs() < 1e-9);
        assert!((stats.mean - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_signal_stats_empty() {
        assert!(signal_stats(&[]).is_none());
    }

    #[test]
    fn test_delivery_rate_uncapped() {
        assert!((delivery_rate(180, 200) - 90.0).abs() < 1e-9);
        assert!((delivery_rate(205, 200) - 102.5).abs() < 1e-9);
        assert_eq!(delivery_rate(5, 0), 0.0);
    }

    #[test]
    fn test_rolling_rate_ramps_then_saturates() {
        let entries: Vec<MessageEntry> = (1..=15).map(|i| entry(i, 7, -100, 5)).collect();
        let points = rolling_delivery_rate(&entries, 10);
        assert_eq!(points.len(), 15);
        for (k, point) in points.iter().enumerate().map(|(i, p)| (i + 1, p)) {
            let expected = k.min(10) as f64 * 10.0;
            assert!((point.delivery_rate - expected).abs() < 1e-9, "k={}", k);
            assert_eq!(point.group_position, k);
        }
    }

    #[test]
    fn test_rolling_rate_groups_independently() {
        let entries = vec![
            entry(1, 7, -100, 5),
            entry(2, 12, -110, -2),
            entry(3, 7, -101, 4),
            entry(4, 12, -111, -3),
            entry(5, 12, -112, -4),
        ];
        let points = rolling_delivery_rate(&entries, 10);
        let rates: Vec<f64> = points.iter().map(|p| p.delivery_rate).collect();
        assert_eq!(rates, vec![10.0, 10.0, 20.0, 20.0, 30.0]);
        assert_eq!(points[4].group_position, 3);
    }

    #[test]
    fn test_rolling_rate_custom_window() {
        let entries: Vec<MessageEntry> = (1..=6).map(|i| entry(i, 9, -100, 5)).collect();
        let points = rolling_delivery_rate(&entries, 4);
        assert_eq!(points[0].delivery_rate, 25.0);
        assert_eq!(points[3].delivery_rate, 100.0);
        assert_eq!(points[5].delivery_rate, 100.0);
    }

    #[test]
    fn test_summarize() {
        let config = AnalysisConfig::default();
        let entries = vec![
            entry(1, 7, -110, 2),
            entry(2, 7, -100, 4),
            entry(3, 9, -90, 6),
        ];
        let summary = summarize(parsed(entries), &config).unwrap();
        assert_eq!(summary.messages_received, 3);
        assert_eq!(summary.expected_messages, 200);
        assert!((summary.delivery_rate - 1.5).abs() < 1e-9);
        assert_eq!(summary.spreading_factor, 7);
        assert_eq!(summary.spreading_factors, vec![7, 9]);
        assert_eq!(summary.payload_size(), 20);
        assert_eq!(summary.rssi.min, -110);
        assert!((summary.snr.mean - 4.0).abs() < 1e-9);
        assert_eq!(summary.rolling_delivery.len(), 3);
    }

    #[test]
    fn test_summarize_empty_is_error() {
        let err = summarize(parsed(Vec::new()), &AnalysisConfig::default()).unwrap_err();
        assert!(err.is_empty_file());
    }
}
