use std::collections::HashMap;

use chrono::{NaiveDate, Timelike};
use log::info;

use crate::error::{AnalysisError, Result};
use crate::models::{AnalysisConfig, ElectricityObservation, HeatwaveLabel, MergedRecord};

/// Joins hourly electricity observations to the per-date heatwave
/// labels. The join is all-or-nothing: every observation must resolve
/// to exactly one label or the whole run fails.
pub struct SeriesAligner {
    config: AnalysisConfig,
}

impl SeriesAligner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Derive (local date, local hour) per observation and attach the
    /// date's label. Output row count equals input row count exactly;
    /// any unmatched row aborts with the exact miss count.
    pub fn align(
        &self,
        observations: &[ElectricityObservation],
        labels: &[HeatwaveLabel],
    ) -> Result<Vec<MergedRecord>> {
        let by_date: HashMap<NaiveDate, u8> = labels
            .iter()
            .map(|label| (label.date, label.is_heatwave))
            .collect();

        let mut merged = Vec::with_capacity(observations.len());
        let mut unmatched = 0usize;

        for obs in observations {
            let local = obs.timestamp.with_timezone(&self.config.timezone);
            let date = local.date_naive();
            let hour = local.time().hour();

            match by_date.get(&date) {
                Some(&heatwave) => merged.push(MergedRecord {
                    date,
                    hour,
                    heatwave,
                    values: obs.values.clone(),
                }),
                None => unmatched += 1,
            }
        }

        if unmatched > 0 {
            return Err(AnalysisError::CoverageError { unmatched });
        }

        info!("aligned {} electricity row(s) to heatwave labels", merged.len());
        Ok(merged)
    }
}
