use log::info;

use crate::aligner::SeriesAligner;
use crate::daily_max::DailyAggregator;
use crate::detector::HeatwaveDetector;
use crate::error::{AnalysisError, Result};
use crate::hourly_stats::{CiStrategy, HourlyStatsAggregator};
use crate::models::{
    AnalysisConfig, AnalysisResult, ElectricityObservation, MergedTable, RunMetadata,
    TemperatureSample,
};

/// Orchestrates the full batch computation: daily maxima, heatwave
/// detection, the strict label join, and one statistics table per
/// configured value column.
///
/// Each stage consumes the complete output of its predecessor; the run
/// either finishes whole or fails with no partial result. Identical
/// inputs and configuration produce bit-identical output.
pub struct HeatwaveAnalyzer {
    config: AnalysisConfig,
    ci_strategy: Box<dyn CiStrategy>,
}

impl HeatwaveAnalyzer {
    pub fn new(config: AnalysisConfig, ci_strategy: Box<dyn CiStrategy>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ci_strategy,
        })
    }

    pub fn analyze(
        &self,
        temperatures: &[TemperatureSample],
        electricity: &[ElectricityObservation],
    ) -> Result<AnalysisResult> {
        let daily = DailyAggregator::new(self.config.clone()).daily_maxima(temperatures)?;
        info!("{} day(s) of daily maxima in the season window", daily.len());

        let detection =
            HeatwaveDetector::new(self.config.quantile, self.config.min_run).detect(&daily)?;

        let in_season = self.season_observations(electricity)?;
        info!(
            "{} of {} electricity row(s) inside the season window",
            in_season.len(),
            electricity.len()
        );

        let merged = SeriesAligner::new(self.config.clone()).align(&in_season, &detection.labels)?;

        let aggregator = HourlyStatsAggregator::new(self.ci_strategy.as_ref());
        let mut stats = Vec::with_capacity(self.config.value_columns.len());
        for (index, column) in self.config.value_columns.iter().enumerate() {
            let table = aggregator.compute(&merged, index)?;
            stats.push((column.clone(), table));
        }

        let meta = RunMetadata {
            era_start: detection.era_start,
            era_end: detection.era_end,
            heatwave_days: detection.heatwave_days,
            total_days: detection.total_days,
            threshold: detection.threshold,
            quantile: self.config.quantile,
            min_run: self.config.min_run,
            year: self.config.year,
            value_columns: self.config.value_columns.clone(),
            ci_method: self.ci_strategy.name().to_string(),
        };

        Ok(AnalysisResult {
            merged: MergedTable {
                columns: self.config.value_columns.clone(),
                records: merged,
            },
            stats,
            meta,
        })
    }

    /// Restrict electricity rows to the season window by local
    /// wall-clock date, preserving input order.
    fn season_observations(
        &self,
        electricity: &[ElectricityObservation],
    ) -> Result<Vec<ElectricityObservation>> {
        let in_season: Vec<ElectricityObservation> = electricity
            .iter()
            .filter(|obs| {
                let local = obs.timestamp.with_timezone(&self.config.timezone);
                self.config.in_season(local.date_naive())
            })
            .cloned()
            .collect();
        if in_season.is_empty() {
            return Err(AnalysisError::EmptyInput { what: "electricity" });
        }
        Ok(in_season)
    }
}
