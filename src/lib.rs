pub mod aligner;
pub mod analyzer;
pub mod daily_max;
pub mod data_loader;
pub mod detector;
pub mod error;
pub mod hourly_stats;
pub mod models;
pub mod output;

pub use aligner::SeriesAligner;
pub use analyzer::HeatwaveAnalyzer;
pub use daily_max::DailyAggregator;
pub use data_loader::DataLoader;
pub use detector::{Detection, HeatwaveDetector};
pub use error::{AnalysisError, Result};
pub use hourly_stats::{CiStrategy, HourlyStatsAggregator, NormalApproxCi, StudentTCi};
pub use models::{
    AnalysisConfig, AnalysisResult, ElectricityObservation, HeatwaveLabel, HourlyGroupStatistic,
    MergedRecord, MergedTable, RunMetadata, TemperatureSample,
};
pub use output::OutputWriter;
