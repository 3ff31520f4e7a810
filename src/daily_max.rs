use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;

use crate::error::{AnalysisError, Result};
use crate::models::{AnalysisConfig, DailySummary, TemperatureSample};

/// Reduces an hourly temperature series to one maximum per local
/// calendar day, restricted to the configured season window.
pub struct DailyAggregator {
    config: AnalysisConfig,
}

impl DailyAggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Group season samples by wall-clock local date and take the
    /// per-date maximum. The recording zone never decides the bucket;
    /// the configured zone does.
    pub fn daily_maxima(&self, samples: &[TemperatureSample]) -> Result<Vec<DailySummary>> {
        let mut maxima: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for sample in samples {
            let local = sample.timestamp.with_timezone(&self.config.timezone);
            let date = local.date_naive();
            if !self.config.in_season(date) {
                continue;
            }
            maxima
                .entry(date)
                .and_modify(|max| {
                    if sample.value > *max {
                        *max = sample.value;
                    }
                })
                .or_insert(sample.value);
        }

        if maxima.is_empty() {
            return Err(AnalysisError::EmptyInput { what: "temperature" });
        }

        debug!("daily maxima computed for {} day(s)", maxima.len());

        Ok(maxima
            .into_iter()
            .map(|(date, max_temp)| DailySummary { date, max_temp })
            .collect())
    }
}
