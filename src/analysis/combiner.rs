//! Cross-experiment comparison keyed by spreading factor and payload size.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::types::*;

/// Delivery rates of a directory pass, one per (spreading factor, payload size)
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonDataset {
    /// Distinct spreading factors, ascending
    pub spreading_factors: Vec<u32>,
    /// Distinct payload sizes, ascending
    pub payload_sizes: Vec<u32>,
    /// Delivery rate per key, the first file in processing order wins
    #[serde(skip)]
    rates: BTreeMap<(u32, u32), f64>,
    /// Files whose key was already taken
    pub duplicates: Vec<String>,
}

impl ComparisonDataset {
    /// Fold file summaries, in processing order, into a comparison grid
    pub fn from_summaries(summaries: &[FileSummary]) -> Self {
        let mut rates = BTreeMap::new();
        let mut duplicates = Vec::new();

        for summary in summaries {
            let key = (summary.spreading_factor, summary.payload_size());
            if rates.contains_key(&key) {
                log::warn!(
                    "{} repeats SF{} / {} bytes, keeping the earlier experiment",
                    summary.file_name,
                    key.0,
                    key.1
                );
                duplicates.push(summary.file_name.clone());
                continue;
            }
            rates.insert(key, summary.delivery_rate);
        }

        let spreading_factors: BTreeSet<u32> = rates.keys().map(|&(sf, _)| sf).collect();
        let payload_sizes: BTreeSet<u32> = rates.keys().map(|&(_, p)| p).collect();

        Self {
            spreading_factors: spreading_factors.into_iter().collect(),
            payload_sizes: payload_sizes.into_iter().collect(),
            rates,
            duplicates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Number of experiments that made it into the grid
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Delivery rate of a pair, `None` when no experiment covered it
    pub fn get(&self, spreading_factor: u32, payload_size: u32) -> Option<f64> {
        self.rates.get(&(spreading_factor, payload_size)).copied()
    }

    /// Grid cell of a pair; absent pairs read as 0% with `present == false`
    pub fn cell(&self, spreading_factor: u32, payload_size: u32) -> ComparisonCell {
        let rate = self.get(spreading_factor, payload_size);
        ComparisonCell {
            spreading_factor,
            payload_size,
            delivery_rate: rate.unwrap_or(0.0),
            present: rate.is_some(),
        }
    }

    /// One row per spreading factor, one cell per payload size
    pub fn grid(&self) -> Vec<Vec<ComparisonCell>> {
        self.spreading_factors
            .iter()
            .map(|&sf| {
                self.payload_sizes
                    .iter()
                    .map(|&payload| self.cell(sf, payload))
                    .collect()
            })
            .collect()
    }

    /// Bar series for a grouped chart: per payload size, the rate for each
    /// spreading factor in axis order
    pub fn series_by_payload(&self) -> Vec<(u32, Vec<ComparisonCell>)> {
        self.payload_sizes
            .iter()
            .map(|&payload| {
                let cells = self
                    .spreading_factors
                    .iter()
                    .map(|&sf| self.cell(sf, payload))
                    .collect();
                (payload, cells)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(file_name: &str, sf: u32, payload: u32, rate: f64) -> FileSummary {
        let stats = SignalStats {
            mean: 0.0,
            median: 0.0,
            min: 0,
            max: 0,
        };
        FileSummary {
            file_name: file_name.to_string(),
            experiment: ExperimentConfig {
                spreading_factor: Some(sf),
                payload_size: Some(payload),
                ..Default::default()
            },
            spreading_factor: sf,
            spreading_factors: vec![sf],
            time_range: None,
            sort_order: SortOrder::Timestamp,
            rssi: stats,
            snr: stats,
            messages_received: 0,
            expected_messages: 200,
            delivery_rate: rate,
            discarded_lines: 0,
            rolling_delivery: Vec::new(),
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_grid_with_absent_pair() {
        let dataset = ComparisonDataset::from_summaries(&[
            summary("a.csv", 7, 20, 95.0),
            summary("b.csv", 12, 20, 60.0),
            summary("c.csv", 7, 50, 80.0),
        ]);

        assert_eq!(dataset.spreading_factors, vec![7, 12]);
        assert_eq!(dataset.payload_sizes, vec![20, 50]);
        assert_eq!(dataset.len(), 3);

        let grid = dataset.grid();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][0].delivery_rate, 95.0);
        assert_eq!(grid[0][1].delivery_rate, 80.0);
        assert_eq!(grid[1][0].delivery_rate, 60.0);

        let absent = grid[1][1];
        assert_eq!(absent.spreading_factor, 12);
        assert_eq!(absent.payload_size, 50);
        assert_eq!(absent.delivery_rate, 0.0);
        assert!(!absent.present);
        assert!(grid[0][0].present);
    }

    #[test]
    fn test_true_zero_is_present() {
        let dataset = ComparisonDataset::from_summaries(&[summary("a.csv", 9, 80, 0.0)]);
        let cell = dataset.cell(9, 80);
        assert_eq!(cell.delivery_rate, 0.0);
        assert!(cell.present);
    }

    #[test]
    fn test_first_write_wins() {
        let dataset = ComparisonDataset::from_summaries(&[
            summary("a.csv", 7, 20, 95.0),
            summary("b.csv", 7, 20, 40.0),
        ]);
        assert_eq!(dataset.get(7, 20), Some(95.0));
        assert_eq!(dataset.duplicates, vec!["b.csv".to_string()]);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_series_by_payload() {
        let dataset = ComparisonDataset::from_summaries(&[
            summary("a.csv", 7, 20, 95.0),
            summary("b.csv", 12, 50, 60.0),
        ]);
        let series = dataset.series_by_payload();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, 20);
        let rates: Vec<f64> = series[0].1.iter().map(|c| c.delivery_rate).collect();
        assert_eq!(rates, vec![95.0, 0.0]);
    }

    #[test]
    fn test_empty() {
        let dataset = ComparisonDataset::from_summaries(&[]);
        assert!(dataset.is_empty());
        assert!(dataset.grid().is_empty());
    }
}
