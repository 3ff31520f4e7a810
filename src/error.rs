use thiserror::Error;

/// Failure taxonomy for the analysis pipeline.
///
/// Every variant aborts the run at the stage that detects it; no stage
/// ever emits partial output.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no {what} rows inside the target season")]
    EmptyInput { what: &'static str },

    #[error("daily maxima series is empty; nothing to detect heatwaves in")]
    InsufficientData,

    #[error("{source_name}: missing required column(s) {missing:?}")]
    SchemaError {
        source_name: String,
        missing: Vec<String>,
    },

    #[error("heatwave label missing for {unmatched} electricity row(s); check coverage/alignment")]
    CoverageError { unmatched: usize },

    #[error("group {group}: statistics missing for hour(s) {missing_hours:?}")]
    IncompleteCoverage { group: u8, missing_hours: Vec<u32> },

    #[error("{field} out of range: {value}")]
    InvalidRange { field: &'static str, value: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("{source_name}: unparseable timestamp {value:?}")]
    TimestampParse { source_name: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
