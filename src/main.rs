use anyhow::Result;
use clap::{Parser, ValueEnum};
use heatwave_analyzer::{
    AnalysisConfig, CiStrategy, DataLoader, HeatwaveAnalyzer, NormalApproxCi, OutputWriter,
    StudentTCi,
};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heatwave_analyzer")]
#[command(about = "Contrast electricity load and day-ahead price on heatwave vs normal days")]
struct Args {
    /// Hourly temperature CSV
    #[arg(long)]
    temperature_csv: PathBuf,

    /// Hourly electricity CSV
    #[arg(long)]
    electricity_csv: PathBuf,

    /// Timestamp column in the temperature CSV
    #[arg(long, default_value = "time")]
    temp_time_col: String,

    /// Temperature value column
    #[arg(long, default_value = "T_pop_C")]
    temp_value_col: String,

    /// Timestamp column in the electricity CSV
    #[arg(long, default_value = "utc_timestamp")]
    elec_time_col: String,

    /// Electricity value columns to analyze (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [
            "DE_load_actual_entsoe_transparency".to_string(),
            "DE_LU_price_day_ahead".to_string(),
        ]
    )]
    columns: Vec<String>,

    /// Target year
    #[arg(long, default_value = "2019")]
    year: i32,

    /// Season months (comma-separated, 1-12)
    #[arg(long, value_delimiter = ',', default_values_t = [6u32, 7, 8, 9])]
    months: Vec<u32>,

    /// IANA timezone id for wall-clock bucketing
    #[arg(long, default_value = "Europe/Berlin")]
    timezone: String,

    /// Heatwave quantile q in (0, 1)
    #[arg(short, long, default_value = "0.90")]
    quantile: f64,

    /// Minimum consecutive hot days for a heatwave
    #[arg(short, long, default_value = "3")]
    min_run: usize,

    /// Confidence-interval critical value source
    #[arg(long, value_enum, default_value = "students-t")]
    ci_method: CiMethod,

    /// Output directory
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Output mode
    #[arg(short, long, value_enum, default_value = "files")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum CiMethod {
    StudentsT,
    Normal,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Files,
    Summary,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let timezone: chrono_tz::Tz = args
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown timezone id '{}'", args.timezone))?;

    let config = AnalysisConfig::new(
        args.year,
        args.months.clone(),
        timezone,
        args.quantile,
        args.min_run,
        args.columns.clone(),
    )?;

    let ci_strategy: Box<dyn CiStrategy> = match args.ci_method {
        CiMethod::StudentsT => Box::new(StudentTCi),
        CiMethod::Normal => {
            warn!("using the normal approximation (1.96); small-n intervals will be too narrow");
            Box::new(NormalApproxCi)
        }
    };

    info!("loading {}", args.temperature_csv.display());
    let loader = DataLoader::new();
    let temperatures = loader.load_temperature(
        &args.temperature_csv,
        &args.temp_time_col,
        &args.temp_value_col,
    )?;
    info!("loaded {} temperature sample(s)", temperatures.len());

    info!("loading {}", args.electricity_csv.display());
    let electricity =
        loader.load_electricity(&args.electricity_csv, &args.elec_time_col, &args.columns)?;
    info!("loaded {} electricity row(s)", electricity.len());

    let analyzer = HeatwaveAnalyzer::new(config, ci_strategy)?;
    let result = analyzer.analyze(&temperatures, &electricity)?;

    match args.format {
        OutputFormat::Files => {
            let writer = OutputWriter::new(&args.output_dir);
            writer.write_all(&result)?;
            println!(
                "Wrote merged table, {} statistics table(s), and meta.json to {}",
                result.stats.len(),
                args.output_dir.display()
            );
        }
        OutputFormat::Summary => {
            let meta = &result.meta;
            println!("Heatwave Analysis Summary");
            println!("=========================");
            println!("Era: {} to {}", meta.era_start, meta.era_end);
            println!(
                "Heatwave days: {} of {} (threshold {:.2}, q={}, min run {})",
                meta.heatwave_days, meta.total_days, meta.threshold, meta.quantile, meta.min_run
            );
            println!("CI method: {}", meta.ci_method);
            println!();

            for (column, table) in &result.stats {
                println!("{column}:");
                for group in 0u8..=1 {
                    let rows: Vec<_> = table.iter().filter(|r| r.heatwave == group).collect();
                    let mean_of_means =
                        rows.iter().map(|r| r.mean).sum::<f64>() / rows.len() as f64;
                    let peak = rows
                        .iter()
                        .max_by(|a, b| a.mean.total_cmp(&b.mean))
                        .map(|r| (r.hour, r.mean))
                        .unwrap_or((0, f64::NAN));
                    let label = if group == 1 { "heatwave" } else { "normal" };
                    println!(
                        "  {label:>8}: mean {mean_of_means:.2}, peak at hour {:02} ({:.2})",
                        peak.0, peak.1
                    );
                }
            }
        }
    }

    Ok(())
}
