//! Command line front end for livability scoring and forecasting.
//!
//! ```text
//! livability forecast --input scores.csv [--horizon 5] [--config pipeline.toml] [--csv out.csv] [--jsonl out.jsonl]
//! livability scores --input scores.csv [--weights Housing=0.3,...] [--output scores.json]
//! livability records --input scores.csv
//! livability top-city --input scores.csv --year 2020
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) for progress output.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use livability_forecast::export::{
    failure_records, save_forecast_csv, save_json_lines, save_json_pretty, write_json_pretty,
};
use livability_forecast::{ForecastError, LivabilityService, PipelineConfig};
use livability_math::WeightMap;

#[derive(Parser)]
#[command(
    name = "livability",
    version,
    about = "Score city livability and forecast it per city"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast the composite score of every city
    Forecast {
        /// Indicator table (CSV)
        #[arg(long)]
        input: PathBuf,
        /// Years to forecast; defaults to the configured horizon
        #[arg(long)]
        horizon: Option<usize>,
        /// Pipeline configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write combined forecast records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write combined forecast records as JSON lines
        #[arg(long)]
        jsonl: Option<PathBuf>,
    },
    /// Average general score per city and year
    Scores {
        /// Indicator table (CSV)
        #[arg(long)]
        input: PathBuf,
        /// Custom weights, e.g. `Housing=0.3,Health=0.3,...` (all seven categories)
        #[arg(long)]
        weights: Option<String>,
        /// Pipeline configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write scores as JSON instead of printing them
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the loaded indicator records as JSON
    Records {
        /// Indicator table (CSV)
        #[arg(long)]
        input: PathBuf,
    },
    /// Highest-scoring city in a year
    TopCity {
        /// Indicator table (CSV)
        #[arg(long)]
        input: PathBuf,
        /// Year to rank
        #[arg(long)]
        year: i32,
        /// Pipeline configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig, ForecastError> {
    match path {
        Some(path) => PipelineConfig::from_file(path),
        None => Ok(PipelineConfig::default()),
    }
}

fn parse_weights(text: &str) -> Result<WeightMap, ForecastError> {
    let mut pairs = Vec::new();
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, value) = item.split_once('=').ok_or_else(|| {
            ForecastError::InvalidParameter(format!("Expected Category=weight, got {item}"))
        })?;
        let weight = value.trim().parse::<f64>().map_err(|_| {
            ForecastError::InvalidParameter(format!("Weight for {name} is not a number: {value}"))
        })?;
        pairs.push((name.trim(), weight));
    }
    Ok(WeightMap::from_pairs(pairs)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            input,
            horizon,
            config,
            csv,
            jsonl,
        } => {
            let service = LivabilityService::from_csv(&input, load_config(config.as_ref())?)?;
            let forecast = service.forecast(horizon)?;

            if let Some(path) = &csv {
                save_forecast_csv(path, &forecast.records)?;
                log::info!("Wrote {} records to {}", forecast.records.len(), path.display());
            }
            if let Some(path) = &jsonl {
                save_json_lines(path, &forecast.records)?;
                log::info!("Wrote {} records to {}", forecast.records.len(), path.display());
            }
            if csv.is_none() && jsonl.is_none() {
                write_json_pretty(io::stdout(), &forecast.by_city())?;
            }

            if !forecast.report.failures.is_empty() {
                write_json_pretty(io::stderr(), &failure_records(&forecast.report.failures))?;
            }
        }
        Commands::Scores {
            input,
            weights,
            config,
            output,
        } => {
            let service = LivabilityService::from_csv(&input, load_config(config.as_ref())?)?;
            let weights = weights.as_deref().map(parse_weights).transpose()?;
            let report = service.compute_scores(weights.as_ref())?;

            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            match output {
                Some(path) => save_json_pretty(&path, &report.scores)?,
                None => write_json_pretty(io::stdout(), &report.scores)?,
            }
        }
        Commands::Records { input } => {
            let service = LivabilityService::from_csv(&input, PipelineConfig::default())?;
            write_json_pretty(io::stdout(), service.precomputed_scores())?;
        }
        Commands::TopCity {
            input,
            year,
            config,
        } => {
            let service = LivabilityService::from_csv(&input, load_config(config.as_ref())?)?;
            match service.top_city(year)? {
                Some(best) => println!(
                    "{} ({:.4}) in {}",
                    best.city, best.average_general_score, best.year
                ),
                None => {
                    eprintln!("No scores for {year}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
