use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Configuration for one analysis run, threaded explicitly through every
/// stage. There is no ambient/global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Target year of the season window.
    pub year: i32,
    /// Calendar months that make up the season (1-12).
    pub months: Vec<u32>,
    /// Reference zone; wall-clock local time decides date and hour buckets.
    pub timezone: Tz,
    /// Heatwave quantile q, exclusive (0, 1).
    pub quantile: f64,
    /// Minimum consecutive hot days for a run to count as a heatwave.
    pub min_run: usize,
    /// Electricity value columns to aggregate (e.g. load, day-ahead price).
    pub value_columns: Vec<String>,
}

impl AnalysisConfig {
    pub fn new(
        year: i32,
        months: Vec<u32>,
        timezone: Tz,
        quantile: f64,
        min_run: usize,
        value_columns: Vec<String>,
    ) -> Result<Self> {
        let config = Self {
            year,
            months,
            timezone,
            quantile,
            min_run,
            value_columns,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.quantile > 0.0 && self.quantile < 1.0) {
            return Err(AnalysisError::InvalidConfig {
                reason: format!("quantile must be in (0, 1), got {}", self.quantile),
            });
        }
        if self.min_run < 1 {
            return Err(AnalysisError::InvalidConfig {
                reason: "min_run must be >= 1".to_string(),
            });
        }
        if self.months.is_empty() || self.months.iter().any(|m| !(1..=12).contains(m)) {
            return Err(AnalysisError::InvalidConfig {
                reason: format!("months must be a non-empty subset of 1-12, got {:?}", self.months),
            });
        }
        if self.value_columns.is_empty() {
            return Err(AnalysisError::InvalidConfig {
                reason: "at least one value column is required".to_string(),
            });
        }
        Ok(())
    }

    /// Whether a local calendar date falls inside the season window.
    pub fn in_season(&self, date: NaiveDate) -> bool {
        date.year() == self.year && self.months.contains(&date.month())
    }
}

/// One hourly temperature reading, timezone-aware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One hourly electricity reading. `values` is parallel to the
/// configured value-column list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricityObservation {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// Per-date maximum temperature inside the season window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub max_temp: f64,
}

/// Per-date heatwave flag, computed once from the full season's
/// distribution and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatwaveLabel {
    pub date: NaiveDate,
    pub is_heatwave: u8,
}

/// One electricity observation joined to its date's heatwave label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub hour: u32,
    pub heatwave: u8,
    pub values: Vec<f64>,
}

/// The merged table plus the column names its value vectors follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub records: Vec<MergedRecord>,
}

/// One (day-type, hour) statistics row. A full table has exactly
/// 48 of these: both groups, all 24 hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyGroupStatistic {
    pub heatwave: u8,
    pub hour: u32,
    pub mean: f64,
    pub std: f64,
    pub n: usize,
    pub se: f64,
    pub crit: f64,
    pub half_width: f64,
    pub lo: f64,
    pub hi: f64,
}

/// Run-level metadata describing the detection window and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub era_start: NaiveDate,
    pub era_end: NaiveDate,
    pub heatwave_days: usize,
    pub total_days: usize,
    pub threshold: f64,
    pub quantile: f64,
    pub min_run: usize,
    pub year: i32,
    pub value_columns: Vec<String>,
    pub ci_method: String,
}

/// Everything one run produces: merged rows, one statistics table per
/// value column, and the metadata record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub merged: MergedTable,
    pub stats: Vec<(String, Vec<HourlyGroupStatistic>)>,
    pub meta: RunMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AnalysisConfig {
        AnalysisConfig {
            year: 2019,
            months: vec![6, 7, 8, 9],
            timezone: chrono_tz::Europe::Berlin,
            quantile: 0.90,
            min_run: 3,
            value_columns: vec!["load".to_string()],
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(base_config().validate().is_ok());

        let mut bad = base_config();
        bad.quantile = 1.0;
        assert!(bad.validate().is_err());

        let mut bad = base_config();
        bad.min_run = 0;
        assert!(bad.validate().is_err());

        let mut bad = base_config();
        bad.months = vec![13];
        assert!(bad.validate().is_err());

        let mut bad = base_config();
        bad.value_columns.clear();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_in_season() {
        let config = base_config();
        let inside = NaiveDate::from_ymd_opt(2019, 7, 15).unwrap();
        let wrong_year = NaiveDate::from_ymd_opt(2018, 7, 15).unwrap();
        let wrong_month = NaiveDate::from_ymd_opt(2019, 5, 31).unwrap();
        assert!(config.in_season(inside));
        assert!(!config.in_season(wrong_year));
        assert!(!config.in_season(wrong_month));
    }
}
