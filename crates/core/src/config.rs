//! Configuration structures for the agrisense pipeline.
//!
//! Every stage takes its own section by reference at construction time; there
//! is no process-wide state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on any configured span of calendar days.
pub const MAX_SPAN_DAYS: i64 = 3650;

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input/output directories.
    pub paths: PathsConfig,
    /// Cleaner configuration.
    pub cleaning: CleaningConfig,
    /// Feature engine configuration.
    pub features: FeatureConfig,
    /// Insight aggregator configuration.
    pub insights: InsightConfig,
    /// Forecaster configuration.
    pub forecast: ForecastConfig,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Sections missing from the file keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that windows, horizons and multipliers are usable.
    pub fn validate(&self) -> Result<()> {
        let f = &self.features;
        if f.short_window == 0 || f.long_window == 0 || f.volatility_window == 0 {
            return Err(Error::config("rolling windows must be at least 1"));
        }
        if !(self.cleaning.iqr_multiplier > 0.0) {
            return Err(Error::config(format!(
                "iqr_multiplier must be positive, got {}",
                self.cleaning.iqr_multiplier
            )));
        }
        if self.insights.top_k == 0 || self.insights.recent_top == 0 {
            return Err(Error::config("insight rankings need at least one entry"));
        }
        if self.forecast.lookback < 2 {
            return Err(Error::config("forecast lookback must cover at least 2 observations"));
        }
        if !(0..=MAX_SPAN_DAYS).contains(&self.insights.recent_days) {
            return Err(Error::config(format!(
                "recent_days must be within 0..={MAX_SPAN_DAYS}, got {}",
                self.insights.recent_days
            )));
        }
        if self.forecast.horizon_days == 0 || i64::from(self.forecast.horizon_days) > MAX_SPAN_DAYS {
            return Err(Error::config(format!(
                "forecast horizon must be within 1..={MAX_SPAN_DAYS} days, got {}",
                self.forecast.horizon_days
            )));
        }
        Ok(())
    }
}

/// Raw and processed data locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for raw input tables.
    pub raw_dir: PathBuf,
    /// Directory for cleaned/featured output tables.
    pub processed_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw_data"),
            processed_dir: PathBuf::from("processed_data"),
        }
    }
}

impl PathsConfig {
    /// Path of the cleaned price table.
    pub fn clean_table(&self) -> PathBuf {
        self.processed_dir.join("clean_commodity_prices.csv")
    }

    /// Path of the featured table.
    pub fn featured_table(&self) -> PathBuf {
        self.processed_dir.join("featured_data.csv")
    }

    /// Path of the insight report.
    pub fn insights_report(&self) -> PathBuf {
        self.processed_dir.join("insights.json")
    }

    /// Path of the per-commodity forecasts.
    pub fn forecasts_report(&self) -> PathBuf {
        self.processed_dir.join("forecasts.json")
    }
}

/// How the cleaner rejects outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Tukey fences computed once over the whole dataset.
    ///
    /// Known limitation: with commodities on very different price scales a
    /// single fence can reject legitimate cheap or expensive commodities.
    GlobalIqr,
    /// Tukey fences computed within each commodity.
    PerCommodityIqr,
    /// Keep every row.
    Disabled,
}

/// Cleaner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Outlier rejection policy.
    pub outlier_policy: OutlierPolicy,
    /// Fence width in IQRs (Tukey's k).
    pub iqr_multiplier: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            outlier_policy: OutlierPolicy::GlobalIqr,
            iqr_multiplier: 1.5,
        }
    }
}

/// Feature engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Window for `avg_7d`.
    pub short_window: usize,
    /// Window for `avg_30d`.
    pub long_window: usize,
    /// Window for `volatility`.
    pub volatility_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            short_window: 7,
            long_window: 30,
            volatility_window: 30,
        }
    }
}

/// Insight aggregator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Entries in each top-K ranking.
    pub top_k: usize,
    /// Days before the latest date that count as "recent" (inclusive).
    pub recent_days: i64,
    /// Entries in the recent-trend ranking.
    pub recent_top: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            recent_days: 7,
            recent_top: 3,
        }
    }
}

/// Where the first forecast day sits on the fitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Day `i` is predicted at position `n + i`; position `n` is never emitted.
    SkipCurrent,
    /// Day `i` is predicted at position `n + i - 1`, continuing the line directly.
    Contiguous,
}

impl Extrapolation {
    /// Position on the fitted line for forecast day `day` (1-based) after a
    /// window of `n` observations.
    #[inline]
    pub fn position(self, n: usize, day: u32) -> f64 {
        match self {
            Extrapolation::SkipCurrent => (n as u64 + day as u64) as f64,
            Extrapolation::Contiguous => (n as u64 + day as u64 - 1) as f64,
        }
    }
}

/// Forecaster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Most recent observations used for the fit.
    pub lookback: usize,
    /// Calendar days to predict.
    pub horizon_days: u32,
    /// Placement of forecast days on the fitted line.
    pub extrapolation: Extrapolation,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback: 30,
            horizon_days: 7,
            extrapolation: Extrapolation::SkipCurrent,
        }
    }
}
