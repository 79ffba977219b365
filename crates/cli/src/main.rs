//! agrisense: commodity price pipeline driver.

mod pipeline;
mod sample;

use agri_core::{Error, FeatureRecord, PipelineConfig};
use agri_forecast::Forecaster;
use agri_ingestion::{read_csv, title_case};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pipeline::{render_forecast, render_insights, Pipeline};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "agrisense=info,agri_ingestion=info,agri_features=info,agri_forecast=info";

#[derive(Parser)]
#[command(name = "agrisense")]
#[command(about = "Clean, enrich, summarize and forecast commodity price tables", long_about = None)]
struct Cli {
    /// Pipeline configuration (JSON). Missing sections use defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic raw price table to the raw directory
    Sample {
        /// Number of rows
        #[arg(short, long, default_value = "1000")]
        rows: usize,

        /// RNG seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run the full pipeline over a raw CSV and write every artifact
    Run {
        /// Raw price table
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Forecast one commodity from a featured table
    Forecast {
        /// Featured table (defaults to the processed directory's featured_data.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Commodity name (case-insensitive)
        #[arg(long)]
        commodity: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sample { rows, seed } => {
            let path = sample::write_sample(&config.paths.raw_dir, rows, seed)
                .context("failed to write sample table")?;
            println!("Sample data written to {}", path.display());
        }
        Commands::Run { input } => run(&config, &input)?,
        Commands::Forecast { input, commodity } => {
            let input = input.unwrap_or_else(|| config.paths.featured_table());
            forecast(&config, &input, &commodity)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn run(config: &PipelineConfig, input: &Path) -> Result<()> {
    let pipeline = Pipeline::new(config);
    let run = pipeline.run_file(input)?;
    let artifacts = pipeline.persist(&run, &config.paths)?;

    println!(
        "Ingested {} of {} rows ({} malformed), kept {} after cleaning ({} outliers)",
        run.ingest.accepted,
        run.ingest.total_rows,
        run.malformed_rows,
        run.clean.output,
        run.clean.outliers
    );
    println!();
    print!("{}", render_insights(&run.insights));
    println!();
    for (commodity, forecast) in &run.forecasts {
        print!("{}", render_forecast(commodity, forecast));
    }
    println!();
    println!("Clean table:    {}", artifacts.clean_table.display());
    println!("Featured table: {}", artifacts.featured_table.display());
    println!("Insights:       {}", artifacts.insights.display());
    println!("Forecasts:      {}", artifacts.forecasts.display());
    Ok(())
}

fn forecast(config: &PipelineConfig, input: &Path, commodity: &str) -> Result<()> {
    let features: Vec<FeatureRecord> = read_csv(input)
        .with_context(|| format!("failed to read featured table {}", input.display()))?;

    let name = title_case(commodity);
    let series: Vec<FeatureRecord> = features.into_iter().filter(|f| f.commodity == name).collect();
    if series.is_empty() {
        return Err(Error::empty_dataset(format!("no rows for commodity {name}")).into());
    }

    let forecast = Forecaster::new(&config.forecast).forecast(&series);
    print!("{}", render_forecast(&name, &forecast));
    Ok(())
}
