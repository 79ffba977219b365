//! Core data types for the agrisense pipeline.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percent change above which a move is `Rising` (and below whose negation it
/// is `Falling`). Fixed; not part of the configuration.
pub const TREND_THRESHOLD_PCT: f64 = 2.0;

/// A single cleaned price observation for one commodity in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Commodity name (title case once cleaned).
    pub commodity: String,
    /// State name (title case once cleaned).
    pub state: String,
    /// Market name.
    pub market: String,
    /// Arrival date.
    pub date: NaiveDate,
    /// Modal (most frequently quoted) price.
    pub modal_price: f64,
    /// Lowest quoted price, when the source has one.
    pub min_price: Option<f64>,
    /// Highest quoted price, when the source has one.
    pub max_price: Option<f64>,
}

/// Record types written as flat tables. `COLUMNS` matches the serialized
/// field order, so an empty table still gets its header row.
pub trait Columns {
    const COLUMNS: &'static [&'static str];
}

impl Columns for PriceRecord {
    const COLUMNS: &'static [&'static str] = &[
        "commodity",
        "state",
        "market",
        "date",
        "modal_price",
        "min_price",
        "max_price",
    ];
}

/// Short-term direction of a price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    /// `pct_change > 2`.
    Rising,
    /// `pct_change < -2`.
    Falling,
    /// Everything else.
    Stable,
}

impl Trend {
    /// Classify a percent change using the fixed ±2% threshold.
    #[inline]
    pub fn from_pct_change(pct_change: f64) -> Self {
        if pct_change > TREND_THRESHOLD_PCT {
            Trend::Rising
        } else if pct_change < -TREND_THRESHOLD_PCT {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
            Trend::Stable => "Stable",
        };
        f.write_str(label)
    }
}

/// A price record extended with features derived from its commodity's series.
///
/// Kept flat so the serialized column names are exactly the field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub commodity: String,
    pub state: String,
    pub market: String,
    pub date: NaiveDate,
    pub modal_price: f64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Trailing mean over the short window.
    pub avg_7d: f64,
    /// Trailing mean over the long window.
    pub avg_30d: f64,
    /// Percent change from the previous observation.
    pub pct_change: f64,
    /// Trailing sample standard deviation.
    pub volatility: f64,
    /// Percent deviation from `avg_7d`.
    pub vs_avg_7d: f64,
    /// Percent deviation from `avg_30d`.
    pub vs_avg_30d: f64,
    pub month: u32,
    pub quarter: u32,
    pub day_of_year: u32,
    /// ISO week number.
    pub week_of_year: u32,
    pub trend: Trend,
}

impl Columns for FeatureRecord {
    const COLUMNS: &'static [&'static str] = &[
        "commodity",
        "state",
        "market",
        "date",
        "modal_price",
        "min_price",
        "max_price",
        "avg_7d",
        "avg_30d",
        "pct_change",
        "volatility",
        "vs_avg_7d",
        "vs_avg_30d",
        "month",
        "quarter",
        "day_of_year",
        "week_of_year",
        "trend",
    ];
}

impl FeatureRecord {
    /// Project back to the underlying price record.
    pub fn price_record(&self) -> PriceRecord {
        PriceRecord {
            commodity: self.commodity.clone(),
            state: self.state.clone(),
            market: self.market.clone(),
            date: self.date,
            modal_price: self.modal_price,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }
}

/// Calendar fields derived from a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub month: u32,
    pub quarter: u32,
    pub day_of_year: u32,
    pub week_of_year: u32,
}

impl CalendarFields {
    /// Derive month, quarter, ordinal day and ISO week.
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        Self {
            month,
            quarter: (month - 1) / 3 + 1,
            day_of_year: date.ordinal(),
            week_of_year: date.iso_week().week(),
        }
    }
}

/// Anything with a date and a price that can be forecast.
pub trait PricePoint {
    fn date(&self) -> NaiveDate;
    fn price(&self) -> f64;
}

impl PricePoint for PriceRecord {
    #[inline]
    fn date(&self) -> NaiveDate {
        self.date
    }

    #[inline]
    fn price(&self) -> f64 {
        self.modal_price
    }
}

impl PricePoint for FeatureRecord {
    #[inline]
    fn date(&self) -> NaiveDate {
        self.date
    }

    #[inline]
    fn price(&self) -> f64 {
        self.modal_price
    }
}

impl<P: PricePoint> PricePoint for &P {
    #[inline]
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    #[inline]
    fn price(&self) -> f64 {
        (**self).price()
    }
}

/// Least-squares line `price ≈ slope * index + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    /// Points the line was fitted on.
    pub observations: usize,
}

impl TrendLine {
    /// Evaluate the line at a (possibly fractional) position.
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// A single predicted price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_price: f64,
}

/// Forecaster output for one commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Forecast {
    /// A fitted line and its extrapolated prices.
    Predicted {
        line: TrendLine,
        last_date: NaiveDate,
        points: Vec<ForecastPoint>,
    },
    /// Fewer than two usable observations.
    InsufficientData { observations: usize },
}

impl Forecast {
    /// Predicted points, empty when there was insufficient data.
    pub fn points(&self) -> &[ForecastPoint] {
        match self {
            Forecast::Predicted { points, .. } => points,
            Forecast::InsufficientData { .. } => &[],
        }
    }

    /// Whether the forecaster refused to predict.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Forecast::InsufficientData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_trend_thresholds() {
        assert_eq!(Trend::from_pct_change(2.0001), Trend::Rising);
        assert_eq!(Trend::from_pct_change(2.0), Trend::Stable);
        assert_eq!(Trend::from_pct_change(0.0), Trend::Stable);
        assert_eq!(Trend::from_pct_change(-2.0), Trend::Stable);
        assert_eq!(Trend::from_pct_change(-2.0001), Trend::Falling);
    }

    #[test]
    fn test_trend_display() {
        assert_eq!(Trend::Rising.to_string(), "Rising");
        assert_eq!(Trend::Falling.to_string(), "Falling");
        assert_eq!(Trend::Stable.to_string(), "Stable");
    }

    #[test]
    fn test_calendar_fields() {
        let cal = CalendarFields::from_date(date(2024, 1, 1));
        assert_eq!(cal.month, 1);
        assert_eq!(cal.quarter, 1);
        assert_eq!(cal.day_of_year, 1);
        assert_eq!(cal.week_of_year, 1);

        // 2024 is a leap year; Dec 31 is day 366 and falls in ISO week 1 of 2025
        let cal = CalendarFields::from_date(date(2024, 12, 31));
        assert_eq!(cal.quarter, 4);
        assert_eq!(cal.day_of_year, 366);
        assert_eq!(cal.week_of_year, 1);

        let cal = CalendarFields::from_date(date(2023, 7, 15));
        assert_eq!(cal.quarter, 3);
        assert_eq!(cal.week_of_year, 28);
    }

    fn csv_header<T: Serialize>(record: &T) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(record).unwrap();
        let bytes = writer.into_inner().unwrap();
        String::from_utf8(bytes).unwrap().lines().next().unwrap().to_string()
    }

    #[test]
    fn test_columns_match_serialized_header() {
        let record = PriceRecord {
            commodity: "Wheat".to_string(),
            state: "Punjab".to_string(),
            market: "Mandi".to_string(),
            date: date(2024, 1, 1),
            modal_price: 2000.0,
            min_price: None,
            max_price: None,
        };
        assert_eq!(csv_header(&record), PriceRecord::COLUMNS.join(","));

        let cal = CalendarFields::from_date(record.date);
        let featured = FeatureRecord {
            commodity: record.commodity.clone(),
            state: record.state.clone(),
            market: record.market.clone(),
            date: record.date,
            modal_price: record.modal_price,
            min_price: None,
            max_price: None,
            avg_7d: 2000.0,
            avg_30d: 2000.0,
            pct_change: 0.0,
            volatility: 0.0,
            vs_avg_7d: 0.0,
            vs_avg_30d: 0.0,
            month: cal.month,
            quarter: cal.quarter,
            day_of_year: cal.day_of_year,
            week_of_year: cal.week_of_year,
            trend: Trend::Stable,
        };
        assert_eq!(csv_header(&featured), FeatureRecord::COLUMNS.join(","));
    }

    #[test]
    fn test_trend_line_at() {
        let line = TrendLine {
            slope: 2.0,
            intercept: 100.0,
            observations: 5,
        };
        assert!((line.at(5.0) - 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_forecast_has_no_points() {
        let forecast = Forecast::InsufficientData { observations: 1 };
        assert!(forecast.is_insufficient());
        assert!(forecast.points().is_empty());
    }

    #[test]
    fn test_forecast_json_tag() {
        let forecast = Forecast::InsufficientData { observations: 1 };
        let json = serde_json::to_string(&forecast).unwrap();
        assert_eq!(json, r#"{"status":"insufficient_data","observations":1}"#);
    }
}
