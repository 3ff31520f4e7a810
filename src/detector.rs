use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::models::{DailySummary, HeatwaveLabel};

/// Detection output: one label per input date plus the run-level facts
/// the metadata record is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub labels: Vec<HeatwaveLabel>,
    pub threshold: f64,
    pub era_start: NaiveDate,
    pub era_end: NaiveDate,
    pub heatwave_days: usize,
    pub total_days: usize,
}

/// Flags heatwave days: a day is labeled 1 iff it sits inside a maximal
/// run of at least `min_run` consecutive days whose maximum is strictly
/// above the q-quantile of the whole season's daily maxima.
pub struct HeatwaveDetector {
    quantile: f64,
    min_run: usize,
}

impl HeatwaveDetector {
    pub fn new(quantile: f64, min_run: usize) -> Self {
        Self { quantile, min_run }
    }

    pub fn detect(&self, daily: &[DailySummary]) -> Result<Detection> {
        if daily.is_empty() {
            return Err(AnalysisError::InsufficientData);
        }

        let mut ordered: Vec<DailySummary> = daily.to_vec();
        ordered.sort_by_key(|d| d.date);

        let threshold = {
            let mut values: Vec<f64> = ordered.iter().map(|d| d.max_temp).collect();
            values.sort_by(f64::total_cmp);
            interpolated_quantile(&values, self.quantile)
        };

        // Strict comparison: a day exactly at the threshold is not hot,
        // so q at the series maximum flags nothing.
        let hot: Vec<bool> = ordered.iter().map(|d| d.max_temp > threshold).collect();

        let mut flags = vec![0u8; ordered.len()];
        let mut i = 0;
        while i < hot.len() {
            if !hot[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < hot.len() && hot[i] {
                i += 1;
            }
            if i - start >= self.min_run {
                for flag in &mut flags[start..i] {
                    *flag = 1;
                }
            }
        }

        let heatwave_days = flags.iter().filter(|&&f| f == 1).count();
        let total_days = ordered.len();
        let era_start = ordered[0].date;
        let era_end = ordered[total_days - 1].date;

        info!(
            "heatwave detection: threshold {:.2}, {} of {} day(s) flagged",
            threshold, heatwave_days, total_days
        );

        let labels = ordered
            .iter()
            .zip(flags)
            .map(|(day, is_heatwave)| HeatwaveLabel {
                date: day.date,
                is_heatwave,
            })
            .collect();

        Ok(Detection {
            labels,
            threshold,
            era_start,
            era_end,
            heatwave_days,
            total_days,
        })
    }
}

/// Linear-interpolation quantile over an ascending-sorted slice: rank
/// h = (n-1)q, interpolated between the two bracketing order statistics.
/// Sorting with `total_cmp` keeps ties adjacent, so equal neighbours
/// interpolate exactly and the result is deterministic.
fn interpolated_quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (n - 1) as f64 * q;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(values: &[f64]) -> Vec<DailySummary> {
        let start = NaiveDate::from_ymd_opt(2019, 7, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &max_temp)| DailySummary {
                date: start + chrono::Duration::days(i as i64),
                max_temp,
            })
            .collect()
    }

    fn flagged_count(detection: &Detection) -> usize {
        detection.labels.iter().filter(|l| l.is_heatwave == 1).count()
    }

    #[test]
    fn test_isolated_hot_days_are_not_heatwaves() {
        // 90th percentile of this series is 34.1, so only the single
        // 35.0 day is hot; a run of one never reaches min_run = 3.
        let days = daily(&[28.0, 29.0, 31.0, 33.0, 34.0, 35.0, 34.0, 30.0, 29.0, 28.0]);
        let detection = HeatwaveDetector::new(0.90, 3).detect(&days).unwrap();

        assert!((detection.threshold - 34.1).abs() < 1e-9);
        assert_eq!(flagged_count(&detection), 0);
        assert!(detection.labels.iter().all(|l| l.is_heatwave == 0));
        assert_eq!(detection.total_days, 10);
        assert_eq!(detection.era_start, NaiveDate::from_ymd_opt(2019, 7, 1).unwrap());
        assert_eq!(detection.era_end, NaiveDate::from_ymd_opt(2019, 7, 10).unwrap());
    }

    #[test]
    fn test_run_length_boundary() {
        // Median threshold is 10.0; the two 30.0 days form a hot run of 2.
        let days = daily(&[10.0, 10.0, 10.0, 30.0, 30.0, 10.0, 10.0, 10.0, 10.0, 10.0]);

        let short = HeatwaveDetector::new(0.5, 3).detect(&days).unwrap();
        assert_eq!(flagged_count(&short), 0);

        let exact = HeatwaveDetector::new(0.5, 2).detect(&days).unwrap();
        assert_eq!(flagged_count(&exact), 2);
        assert_eq!(exact.labels[3].is_heatwave, 1);
        assert_eq!(exact.labels[4].is_heatwave, 1);
        assert_eq!(exact.heatwave_days, 2);
    }

    #[test]
    fn test_threshold_at_maximum_flags_nothing() {
        // All-equal series: threshold equals the maximum, strict >
        // leaves every day cold.
        let days = daily(&[25.0; 8]);
        let detection = HeatwaveDetector::new(0.90, 1).detect(&days).unwrap();
        assert_eq!(flagged_count(&detection), 0);
    }

    #[test]
    fn test_window_shorter_than_min_run_is_all_zero() {
        let days = daily(&[40.0, 41.0]);
        let detection = HeatwaveDetector::new(0.10, 3).detect(&days).unwrap();
        assert_eq!(flagged_count(&detection), 0);
    }

    #[test]
    fn test_count_monotone_in_quantile() {
        let days = daily(&[
            20.0, 25.0, 31.0, 32.0, 33.0, 35.0, 36.0, 34.0, 26.0, 22.0, 30.0, 31.5, 33.5, 21.0,
        ]);
        let mut previous = usize::MAX;
        for q in [0.1, 0.3, 0.5, 0.7, 0.9] {
            let detection = HeatwaveDetector::new(q, 2).detect(&days).unwrap();
            let count = flagged_count(&detection);
            assert!(count <= previous, "count increased at q={q}");
            previous = count;
        }
    }

    #[test]
    fn test_deterministic() {
        let days = daily(&[28.0, 33.0, 35.0, 35.5, 34.0, 29.0, 30.0]);
        let detector = HeatwaveDetector::new(0.75, 2);
        let a = detector.detect(&days).unwrap();
        let b = detector.detect(&days).unwrap();
        assert_eq!(a.threshold, b.threshold);
        assert_eq!(
            a.labels.iter().map(|l| l.is_heatwave).collect::<Vec<_>>(),
            b.labels.iter().map(|l| l.is_heatwave).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let err = HeatwaveDetector::new(0.9, 3).detect(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData));
    }

    #[test]
    fn test_interpolated_quantile() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((interpolated_quantile(&values, 0.5) - 2.5).abs() < 1e-12);
        assert!((interpolated_quantile(&values, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(interpolated_quantile(&[7.0], 0.9), 7.0);
    }
}
