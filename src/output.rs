use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::models::AnalysisResult;

/// Persists a completed analysis: the merged table, one statistics CSV
/// per value column, and the run metadata. Nothing is written unless
/// the whole analysis already succeeded.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_all(&self, result: &AnalysisResult) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_merged(result)?;
        for (column, table) in &result.stats {
            let path = self.dir.join(format!("hourly_means_ci_{column}.csv"));
            let mut writer = csv::Writer::from_path(&path)?;
            for row in table {
                writer.serialize(row)?;
            }
            writer.flush()?;
            info!("wrote {}", path.display());
        }
        self.write_meta(result)?;
        Ok(())
    }

    fn write_merged(&self, result: &AnalysisResult) -> Result<()> {
        let path = self.dir.join("merged.csv");
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["date".to_string(), "hour".to_string(), "heatwave".to_string()];
        header.extend(result.merged.columns.iter().cloned());
        writer.write_record(&header)?;

        for record in &result.merged.records {
            let mut row = vec![
                record.date.format("%Y-%m-%d").to_string(),
                record.hour.to_string(),
                record.heatwave.to_string(),
            ];
            row.extend(record.values.iter().map(|v| v.to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        info!("wrote {} ({} rows)", path.display(), result.merged.records.len());
        Ok(())
    }

    fn write_meta(&self, result: &AnalysisResult) -> Result<()> {
        let path = self.dir.join("meta.json");
        let json = serde_json::to_string_pretty(&result.meta)?;
        fs::write(&path, json)?;
        info!("wrote {}", path.display());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        HourlyGroupStatistic, MergedRecord, MergedTable, RunMetadata,
    };
    use chrono::NaiveDate;

    fn sample_result() -> AnalysisResult {
        let records = vec![MergedRecord {
            date: NaiveDate::from_ymd_opt(2019, 6, 5).unwrap(),
            hour: 13,
            heatwave: 1,
            values: vec![51_234.0, 41.5],
        }];
        let row = HourlyGroupStatistic {
            heatwave: 1,
            hour: 13,
            mean: 51_234.0,
            std: 0.0,
            n: 1,
            se: 0.0,
            crit: 12.7062,
            half_width: 0.0,
            lo: 51_234.0,
            hi: 51_234.0,
        };
        AnalysisResult {
            merged: MergedTable {
                columns: vec!["load".to_string(), "price".to_string()],
                records,
            },
            stats: vec![
                ("load".to_string(), vec![row.clone()]),
                ("price".to_string(), vec![row]),
            ],
            meta: RunMetadata {
                era_start: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
                era_end: NaiveDate::from_ymd_opt(2019, 9, 30).unwrap(),
                heatwave_days: 12,
                total_days: 122,
                threshold: 31.7,
                quantile: 0.90,
                min_run: 3,
                year: 2019,
                value_columns: vec!["load".to_string(), "price".to_string()],
                ci_method: "students-t".to_string(),
            },
        }
    }

    #[test]
    fn test_write_all_produces_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        writer.write_all(&sample_result()).unwrap();

        let merged = fs::read_to_string(dir.path().join("merged.csv")).unwrap();
        assert!(merged.starts_with("date,hour,heatwave,load,price\n"));
        assert!(merged.contains("2019-06-05,13,1,51234,41.5"));

        for name in ["hourly_means_ci_load.csv", "hourly_means_ci_price.csv"] {
            let stats = fs::read_to_string(dir.path().join(name)).unwrap();
            assert!(stats.starts_with("heatwave,hour,mean,std,n,se,crit,half_width,lo,hi\n"));
        }

        let meta = fs::read_to_string(dir.path().join("meta.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&meta).unwrap();
        assert_eq!(parsed["heatwave_days"], 12);
        assert_eq!(parsed["ci_method"], "students-t");
        assert_eq!(parsed["era_start"], "2019-06-01");
    }
}
