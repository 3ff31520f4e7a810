use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;

use crate::error::{AnalysisError, Result};
use crate::models::{ElectricityObservation, TemperatureSample};

/// CSV ingestion for the two source series. Produces timezone-aware
/// instants and finite numeric fields; the core stages downstream
/// treat their inputs as already clean.
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load an hourly temperature series from `path`, reading the
    /// timestamp from `time_col` and the reading from `value_col`.
    pub fn load_temperature(
        &self,
        path: &Path,
        time_col: &str,
        value_col: &str,
    ) -> Result<Vec<TemperatureSample>> {
        let source_name = path.display().to_string();
        let mut reader = csv::Reader::from_path(path)?;
        let indices = require_columns(&mut reader, &source_name, &[time_col, value_col])?;
        let (time_idx, value_idx) = (indices[0], indices[1]);

        let mut samples = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record?;
            let raw_time = record.get(time_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time, &source_name)?;
            match parse_value(record.get(value_idx)) {
                Some(value) => samples.push(TemperatureSample { timestamp, value }),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("{source_name}: skipped {skipped} row(s) with missing {value_col}");
        }
        Ok(samples)
    }

    /// Load hourly electricity observations from `path`. Each returned
    /// row's `values` vector follows the order of `value_cols`.
    pub fn load_electricity(
        &self,
        path: &Path,
        time_col: &str,
        value_cols: &[String],
    ) -> Result<Vec<ElectricityObservation>> {
        let source_name = path.display().to_string();
        let mut reader = csv::Reader::from_path(path)?;

        let mut required: Vec<&str> = vec![time_col];
        required.extend(value_cols.iter().map(String::as_str));
        let indices = require_columns(&mut reader, &source_name, &required)?;
        let time_idx = indices[0];
        let value_indices = &indices[1..];

        let mut observations = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record?;
            let raw_time = record.get(time_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time, &source_name)?;

            let values: Option<Vec<f64>> = value_indices
                .iter()
                .map(|&idx| parse_value(record.get(idx)))
                .collect();
            match values {
                Some(values) => observations.push(ElectricityObservation { timestamp, values }),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("{source_name}: skipped {skipped} row(s) with missing value column(s)");
        }
        Ok(observations)
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the header index of every required column, failing with the
/// exact list of absent names.
fn require_columns(
    reader: &mut csv::Reader<std::fs::File>,
    source_name: &str,
    columns: &[&str],
) -> Result<Vec<usize>> {
    let headers = reader.headers()?.clone();
    let mut indices = Vec::with_capacity(columns.len());
    let mut missing = Vec::new();
    for column in columns {
        match headers.iter().position(|h| h == *column) {
            Some(idx) => indices.push(idx),
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(AnalysisError::SchemaError {
            source_name: source_name.to_string(),
            missing,
        });
    }
    Ok(indices)
}

/// Accepts RFC 3339 instants or naive `%Y-%m-%d %H:%M:%S` interpreted
/// as UTC, matching the two timestamp shapes the source files use.
fn parse_timestamp(raw: &str, source_name: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(AnalysisError::TimestampParse {
        source_name: source_name.to_string(),
        value: raw.to_string(),
    })
}

/// Empty or unparseable cells become `None`; the caller skips the row.
fn parse_value(cell: Option<&str>) -> Option<f64> {
    let trimmed = cell?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
