//! Linear-trend forecaster.
//!
//! Fits a least-squares line over the most recent observations of one
//! commodity and extrapolates it over consecutive calendar days. The fit uses
//! positional indices, so gaps between historical dates are not corrected for.

use agri_core::config::{Extrapolation, ForecastConfig};
use agri_core::{FeatureRecord, Forecast, ForecastPoint, PricePoint};
use crate::linear::fit_line;
use chrono::Days;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Per-commodity linear forecaster.
pub struct Forecaster {
    lookback: usize,
    horizon_days: u32,
    extrapolation: Extrapolation,
}

impl Forecaster {
    /// Create a forecaster from configuration.
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            lookback: config.lookback,
            horizon_days: config.horizon_days,
            extrapolation: config.extrapolation,
        }
    }

    /// Forecast one commodity's series.
    ///
    /// Returns [`Forecast::InsufficientData`] when the series has fewer than
    /// two observations, or fewer than two finite prices remain in the
    /// lookback window.
    pub fn forecast<P: PricePoint>(&self, series: &[P]) -> Forecast {
        if series.len() < 2 {
            return Forecast::InsufficientData {
                observations: series.len(),
            };
        }

        let mut ordered: Vec<&P> = series.iter().collect();
        ordered.sort_by_key(|p| p.date());
        let window = &ordered[ordered.len().saturating_sub(self.lookback)..];

        let Some(last_date) = window.iter().map(|p| p.date()).max() else {
            return Forecast::InsufficientData { observations: 0 };
        };
        let prices: Vec<f64> = window
            .iter()
            .map(|p| p.price())
            .filter(|v| v.is_finite())
            .collect();

        let Some(line) = fit_line(&prices) else {
            return Forecast::InsufficientData {
                observations: prices.len(),
            };
        };

        let n = prices.len();
        // Horizon is cut short at the end of the representable calendar.
        let points: Vec<ForecastPoint> = (1..=self.horizon_days)
            .map_while(|day| {
                let date = last_date.checked_add_days(Days::new(u64::from(day)))?;
                Some(ForecastPoint {
                    date,
                    predicted_price: line.at(self.extrapolation.position(n, day)).max(0.0),
                })
            })
            .collect();
        if points.len() < self.horizon_days as usize {
            warn!(%last_date, horizon = self.horizon_days, kept = points.len(), "forecast horizon truncated");
        }

        debug!(slope = line.slope, intercept = line.intercept, n, %last_date, "fitted trend");
        Forecast::Predicted {
            line,
            last_date,
            points,
        }
    }

    /// Forecast every commodity in a featured table.
    pub fn forecast_all(&self, features: &[FeatureRecord]) -> BTreeMap<String, Forecast> {
        let mut by_commodity: BTreeMap<&str, Vec<&FeatureRecord>> = BTreeMap::new();
        for f in features {
            by_commodity.entry(f.commodity.as_str()).or_default().push(f);
        }

        let forecasts: BTreeMap<String, Forecast> = by_commodity
            .into_iter()
            .map(|(commodity, series)| {
                let forecast = self.forecast(&series);
                if let Forecast::InsufficientData { observations } = forecast {
                    warn!(commodity, observations, "insufficient data for forecast");
                }
                (commodity.to_string(), forecast)
            })
            .collect();

        info!(
            commodities = forecasts.len(),
            predicted = forecasts.values().filter(|f| !f.is_insufficient()).count(),
            "forecast complete"
        );
        forecasts
    }
}
