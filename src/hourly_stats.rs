use std::collections::BTreeMap;

use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{AnalysisError, Result};
use crate::models::{HourlyGroupStatistic, MergedRecord};

/// Two-sided 95% interval: critical values are taken at the 97.5th
/// percentile of the chosen distribution.
const UPPER_TAIL: f64 = 0.975;

/// Normal-approximation critical value for a two-sided 95% interval.
const NORMAL_CRIT_95: f64 = 1.96;

/// Swappable critical-value source for the confidence interval,
/// injected at construction rather than branched inline.
pub trait CiStrategy {
    fn critical_value(&self, n: usize) -> f64;

    /// Short identifier surfaced in the run metadata so a degraded
    /// method is never silent.
    fn name(&self) -> &'static str;
}

/// Student-t critical value at df = max(n - 1, 1). The default.
pub struct StudentTCi;

impl CiStrategy for StudentTCi {
    fn critical_value(&self, n: usize) -> f64 {
        let df = n.saturating_sub(1).max(1) as f64;
        match StudentsT::new(0.0, 1.0, df) {
            Ok(dist) => dist.inverse_cdf(UPPER_TAIL),
            // df >= 1, so construction cannot fail
            Err(_) => NORMAL_CRIT_95,
        }
    }

    fn name(&self) -> &'static str {
        "students-t"
    }
}

/// Asymptotic normal approximation (constant 1.96). Less accurate for
/// small n; callers opt in explicitly and the choice is recorded in the
/// run metadata.
pub struct NormalApproxCi;

impl CiStrategy for NormalApproxCi {
    fn critical_value(&self, _n: usize) -> f64 {
        NORMAL_CRIT_95
    }

    fn name(&self) -> &'static str {
        "normal"
    }
}

/// Computes per (day-type, hour-of-day) mean/std/CI statistics for one
/// value column of the merged table.
///
/// Sample standard deviation is undefined at n = 1; this aggregator
/// defines it as 0.0 for n < 2, so single-sample cells collapse to a
/// zero-width interval around the mean.
pub struct HourlyStatsAggregator<'a> {
    strategy: &'a dyn CiStrategy,
}

impl<'a> HourlyStatsAggregator<'a> {
    pub fn new(strategy: &'a dyn CiStrategy) -> Self {
        Self { strategy }
    }

    /// Produce the full 48-row (2 groups x 24 hours) statistics table
    /// for the value column at `column_index`, sorted by (group, hour).
    /// Any missing cell is a hard failure naming the exact hours.
    pub fn compute(
        &self,
        records: &[MergedRecord],
        column_index: usize,
    ) -> Result<Vec<HourlyGroupStatistic>> {
        // Collapse to one value per (group, hour, date) cell first so
        // sub-hourly duplicates cannot overweight their hour. BTreeMap
        // keeps summation order fixed, so repeat runs are bit-identical.
        let mut cells: BTreeMap<(u8, u32, NaiveDate), (f64, usize)> = BTreeMap::new();
        for record in records {
            if record.hour > 23 {
                return Err(AnalysisError::InvalidRange {
                    field: "hour",
                    value: record.hour.to_string(),
                });
            }
            if record.heatwave > 1 {
                return Err(AnalysisError::InvalidRange {
                    field: "heatwave",
                    value: record.heatwave.to_string(),
                });
            }
            let value = record.values.get(column_index).copied().ok_or_else(|| {
                AnalysisError::InvalidConfig {
                    reason: format!(
                        "value column index {} out of bounds for row with {} value(s)",
                        column_index,
                        record.values.len()
                    ),
                }
            })?;

            let entry = cells
                .entry((record.heatwave, record.hour, record.date))
                .or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let mut groups: BTreeMap<(u8, u32), Vec<f64>> = BTreeMap::new();
        for ((heatwave, hour, _date), (sum, count)) in cells {
            groups
                .entry((heatwave, hour))
                .or_default()
                .push(sum / count as f64);
        }

        // Completeness before any arithmetic: all 24 hours for both
        // groups, or the computation failed as a whole.
        for group in 0u8..=1 {
            let missing_hours: Vec<u32> = (0..24)
                .filter(|hour| !groups.contains_key(&(group, *hour)))
                .collect();
            if !missing_hours.is_empty() {
                return Err(AnalysisError::IncompleteCoverage {
                    group,
                    missing_hours,
                });
            }
        }

        let mut rows = Vec::with_capacity(48);
        for ((heatwave, hour), values) in groups {
            let n = values.len();
            let mean = values.iter().sum::<f64>() / n as f64;
            let std = sample_std(&values, mean);
            let se = std / (n.max(1) as f64).sqrt();
            let crit = self.strategy.critical_value(n);
            let half_width = crit * se;
            rows.push(HourlyGroupStatistic {
                heatwave,
                hour,
                mean,
                std,
                n,
                se,
                crit,
                half_width,
                lo: mean - half_width,
                hi: mean + half_width,
            });
        }
        Ok(rows)
    }
}

/// Sample standard deviation (n - 1 divisor); 0.0 when n < 2.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}
