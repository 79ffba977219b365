//! End-to-end pipeline: ingest, clean, engineer, summarize, forecast.

use agri_core::config::PathsConfig;
use agri_core::{FeatureRecord, Forecast, PipelineConfig, PriceRecord};
use agri_features::{FeatureEngine, InsightAggregator, InsightReport};
use agri_forecast::Forecaster;
use agri_ingestion::{
    read_raw_csv, write_csv, CleanStats, Cleaner, IngestStats, RawRow, RecordIngestor,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Every table and report produced by one run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Records the CSV layer could not decode.
    pub malformed_rows: usize,
    pub ingest: IngestStats,
    pub clean: CleanStats,
    pub cleaned: Vec<PriceRecord>,
    pub features: Vec<FeatureRecord>,
    pub insights: InsightReport,
    pub forecasts: BTreeMap<String, Forecast>,
}

/// Files written by [`Pipeline::persist`].
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub clean_table: PathBuf,
    pub featured_table: PathBuf,
    pub insights: PathBuf,
    pub forecasts: PathBuf,
}

/// Runs every stage with one configuration.
pub struct Pipeline {
    ingestor: RecordIngestor,
    cleaner: Cleaner,
    engine: FeatureEngine,
    aggregator: InsightAggregator,
    forecaster: Forecaster,
}

impl Pipeline {
    /// Build every stage from its configuration section.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            ingestor: RecordIngestor::new(),
            cleaner: Cleaner::new(&config.cleaning),
            engine: FeatureEngine::new(&config.features),
            aggregator: InsightAggregator::new(&config.insights),
            forecaster: Forecaster::new(&config.forecast),
        }
    }

    /// Run all stages over in-memory rows.
    pub fn run(&self, rows: &[RawRow]) -> PipelineRun {
        let ingested = self.ingestor.ingest(rows);
        let cleaned = self.cleaner.clean(&ingested.records);
        let features = self.engine.engineer(&cleaned.records);
        let insights = self.aggregator.summarize(&features);
        let forecasts = self.forecaster.forecast_all(&features);

        PipelineRun {
            malformed_rows: 0,
            ingest: ingested.stats,
            clean: cleaned.stats,
            cleaned: cleaned.records,
            features,
            insights,
            forecasts,
        }
    }

    /// Read a raw CSV and run all stages over it.
    pub fn run_file(&self, input: &Path) -> Result<PipelineRun> {
        let table = read_raw_csv(input)
            .with_context(|| format!("failed to read raw table {}", input.display()))?;
        let mut run = self.run(&table.rows);
        run.malformed_rows = table.malformed;
        Ok(run)
    }

    /// Write the clean and featured tables plus the JSON reports.
    pub fn persist(&self, run: &PipelineRun, paths: &PathsConfig) -> Result<Artifacts> {
        let artifacts = Artifacts {
            clean_table: paths.clean_table(),
            featured_table: paths.featured_table(),
            insights: paths.insights_report(),
            forecasts: paths.forecasts_report(),
        };

        write_csv(&artifacts.clean_table, &run.cleaned)
            .with_context(|| format!("failed to write {}", artifacts.clean_table.display()))?;
        write_csv(&artifacts.featured_table, &run.features)
            .with_context(|| format!("failed to write {}", artifacts.featured_table.display()))?;
        write_json(&artifacts.insights, &run.insights)?;
        write_json(&artifacts.forecasts, &run.forecasts)?;

        info!(dir = %paths.processed_dir.display(), "persisted pipeline outputs");
        Ok(artifacts)
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Human-readable summary of an insight report.
pub fn render_insights(report: &InsightReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let Some(latest) = report.latest_date else {
        return "No data available for insights.\n".to_string();
    };

    let _ = writeln!(
        out,
        "{} records, {} commodities, latest date {latest}",
        report.record_count, report.commodity_count
    );

    let _ = writeln!(out, "\nMost expensive commodities (average price):");
    for e in &report.top_by_price {
        let _ = writeln!(out, "  {}: ₹{:.2}", e.name, e.value);
    }
    let _ = writeln!(out, "\nMost volatile commodities:");
    for e in &report.top_by_volatility {
        let _ = writeln!(out, "  {}: {:.2}", e.name, e.value);
    }
    let _ = writeln!(out, "\nState-wise average prices:");
    for e in &report.top_states_by_price {
        let _ = writeln!(out, "  {}: ₹{:.2}", e.name, e.value);
    }
    let _ = writeln!(out, "\nRecent trends:");
    for e in &report.recent_trends {
        let sign = if e.value > 0.0 { "+" } else { "" };
        let _ = writeln!(out, "  {}: {sign}{:.2}%", e.name, e.value);
    }
    out
}

/// Human-readable forecast for one commodity.
pub fn render_forecast(commodity: &str, forecast: &Forecast) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    match forecast {
        Forecast::InsufficientData { observations } => {
            let _ = writeln!(
                out,
                "{commodity}: insufficient data for prediction ({observations} usable observations)"
            );
        }
        Forecast::Predicted { line, points, .. } => {
            let _ = writeln!(
                out,
                "{commodity}: slope {:.4}/obs, intercept {:.2} over {} observations",
                line.slope, line.intercept, line.observations
            );
            for p in points {
                let _ = writeln!(out, "  {}  ₹{:.2}", p.date, p.predicted_price);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_core::config::ForecastConfig;
    use agri_core::{Columns, Trend};
    use approx::assert_relative_eq;

    fn raw(commodity: &str, state: &str, date: &str, price: &str) -> RawRow {
        RawRow {
            commodity: Some(commodity.to_string()),
            state: Some(state.to_string()),
            market: Some("APMC Market".to_string()),
            arrival_date: Some(date.to_string()),
            modal_price: Some(price.to_string()),
            ..RawRow::default()
        }
    }

    fn sample_rows() -> Vec<RawRow> {
        vec![
            raw(" wheat", "punjab", "2024-01-01", "2000"),
            raw("Wheat", "Punjab", "2024-01-02", "2030"),
            raw("WHEAT", "haryana", "03/01/2024", "2020"),
            raw("Wheat", "Punjab", "2024-01-04", "2100"),
            raw("rice", "punjab", "2024-01-02", "2400"),
            raw("Rice", "Tamil Nadu", "2024-01-04", "2450"),
            raw("Rice", "Tamil Nadu", "garbage", "2450"),
            raw("Rice", "Tamil Nadu", "2024-01-05", ""),
            raw("Cotton", "Maharashtra", "2024-01-04", "5200"),
        ]
    }

    #[test]
    fn test_run_end_to_end() {
        let pipeline = Pipeline::new(&PipelineConfig::default());
        let run = pipeline.run(&sample_rows());

        assert_eq!(run.ingest.total_rows, 9);
        assert_eq!(run.ingest.accepted, 7);
        assert_eq!(run.ingest.bad_date, 1);
        assert_eq!(run.ingest.missing_field, 1);

        // Cotton at 5200 sits above the global fence
        assert_eq!(run.clean.outliers, 1);
        assert_eq!(run.features.len(), 6);
        assert!(run.features.iter().all(|f| f.commodity == "Rice" || f.commodity == "Wheat"));

        let wheat: Vec<&FeatureRecord> = run.features.iter().filter(|f| f.commodity == "Wheat").collect();
        assert_eq!(wheat.len(), 4);
        assert_eq!(wheat[0].avg_7d, 2000.0);
        assert_eq!(wheat[0].pct_change, 0.0);
        assert_relative_eq!(wheat[1].pct_change, 1.5, epsilon = 1e-9);
        assert_eq!(wheat[1].trend, Trend::Stable);
        assert_eq!(wheat[3].trend, Trend::Rising);

        assert_eq!(run.insights.top_by_price[0].name, "Rice");
        assert_eq!(run.insights.top_states_by_price.len(), 3);
        assert!(run.insights.top_states_by_price.iter().any(|e| e.name == "Tamil Nadu"));

        assert_eq!(run.forecasts.len(), 2);
        assert_eq!(run.forecasts["Wheat"].points().len(), ForecastConfig::default().horizon_days as usize);
        assert_eq!(
            run.forecasts["Wheat"].points()[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_run_file_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        std::fs::write(
            &input,
            "commodity,state,market,arrival_date,modal_price,min_price,max_price\n\
             Onion,Maharashtra,Lasalgaon,2024-02-01,25,22,28\n\
             Onion,Maharashtra,Lasalgaon,2024-02-02,26,23,29\n\
             Onion,Maharashtra,Pune,2024-02-03,24,,\n",
        )
        .unwrap();

        let pipeline = Pipeline::new(&PipelineConfig::default());
        let run = pipeline.run_file(&input).unwrap();
        assert_eq!(run.features.len(), 3);

        let paths = PathsConfig {
            processed_dir: dir.path().join("processed"),
            ..PathsConfig::default()
        };
        let artifacts = pipeline.persist(&run, &paths).unwrap();
        assert_eq!(artifacts.featured_table, dir.path().join("processed").join("featured_data.csv"));
        let featured = std::fs::read_to_string(&artifacts.featured_table).unwrap();
        let header = featured.lines().next().unwrap();
        assert_eq!(
            header,
            "commodity,state,market,date,modal_price,min_price,max_price,avg_7d,avg_30d,\
             pct_change,volatility,vs_avg_7d,vs_avg_30d,month,quarter,day_of_year,week_of_year,trend"
        );

        let back: Vec<FeatureRecord> = agri_ingestion::read_csv(&artifacts.featured_table).unwrap();
        assert_eq!(back, run.features);

        let forecasts: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&artifacts.forecasts).unwrap()).unwrap();
        assert_eq!(forecasts["Onion"]["status"], "predicted");
        assert!(artifacts.insights.exists());
        assert!(artifacts.clean_table.exists());
    }

    #[test]
    fn test_empty_input_degrades() {
        let pipeline = Pipeline::new(&PipelineConfig::default());
        let run = pipeline.run(&[]);

        assert!(run.cleaned.is_empty());
        assert!(run.features.is_empty());
        assert!(run.forecasts.is_empty());
        assert!(render_insights(&run.insights).contains("No data"));
    }

    #[test]
    fn test_persist_empty_run_writes_headers() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(&PipelineConfig::default());
        let run = pipeline.run(&[]);

        let paths = PathsConfig {
            processed_dir: dir.path().to_path_buf(),
            ..PathsConfig::default()
        };
        let artifacts = pipeline.persist(&run, &paths).unwrap();

        let clean = std::fs::read_to_string(&artifacts.clean_table).unwrap();
        assert_eq!(clean.lines().next(), Some(PriceRecord::COLUMNS.join(",").as_str()));
        let featured = std::fs::read_to_string(&artifacts.featured_table).unwrap();
        assert_eq!(featured.lines().next(), Some(FeatureRecord::COLUMNS.join(",").as_str()));
        assert_eq!(featured.lines().count(), 1);
    }

    #[test]
    fn test_render_forecast() {
        let text = render_forecast("Onion", &Forecast::InsufficientData { observations: 1 });
        assert!(text.contains("insufficient data"));
    }
}
