//! Feature computation engine.
//!
//! Partitions a cleaned table by commodity, walks each partition in date
//! order with trailing windows, and reassembles the rows in input order.

use agri_core::config::FeatureConfig;
use agri_core::{CalendarFields, FeatureRecord, PriceRecord, Trend};
use crate::rolling::RollingWindow;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Feature computation engine.
pub struct FeatureEngine {
    short_window: usize,
    long_window: usize,
    volatility_window: usize,
}

/// Per-commodity state while walking one partition.
struct SeriesState {
    short: RollingWindow,
    long: RollingWindow,
    volatility: RollingWindow,
    prev_price: Option<f64>,
}

impl SeriesState {
    fn step(&mut self, record: &PriceRecord) -> FeatureRecord {
        let price = record.modal_price;
        self.short.push(price);
        self.long.push(price);
        self.volatility.push(price);

        let avg_7d = self.short.mean().unwrap_or(price);
        let avg_30d = self.long.mean().unwrap_or(price);
        let pct_change = self.prev_price.map_or(0.0, |prev| percent_diff(price, prev));
        self.prev_price = Some(price);

        let cal = CalendarFields::from_date(record.date);

        FeatureRecord {
            commodity: record.commodity.clone(),
            state: record.state.clone(),
            market: record.market.clone(),
            date: record.date,
            modal_price: price,
            min_price: record.min_price,
            max_price: record.max_price,
            avg_7d,
            avg_30d,
            pct_change,
            volatility: self.volatility.std_dev().unwrap_or(0.0),
            vs_avg_7d: percent_diff(price, avg_7d),
            vs_avg_30d: percent_diff(price, avg_30d),
            month: cal.month,
            quarter: cal.quarter,
            day_of_year: cal.day_of_year,
            week_of_year: cal.week_of_year,
            trend: Trend::from_pct_change(pct_change),
        }
    }
}

/// `(value - base) / base * 100`, or 0 when `base` is zero or the result is
/// not finite.
#[inline]
fn percent_diff(value: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    let pct = (value - base) / base * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

impl FeatureEngine {
    /// Create a new feature engine from configuration.
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            short_window: config.short_window,
            long_window: config.long_window,
            volatility_window: config.volatility_window,
        }
    }

    fn new_series(&self) -> SeriesState {
        SeriesState {
            short: RollingWindow::new(self.short_window),
            long: RollingWindow::new(self.long_window),
            volatility: RollingWindow::new(self.volatility_window),
            prev_price: None,
        }
    }

    /// Derive features for every record.
    ///
    /// Each commodity is processed independently in date order (stable, so
    /// same-date rows keep their relative order). The output has one row per
    /// input row, in input order.
    pub fn engineer(&self, records: &[PriceRecord]) -> Vec<FeatureRecord> {
        if records.is_empty() {
            warn!("no records to engineer features from");
            return Vec::new();
        }

        let mut partitions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            partitions.entry(record.commodity.as_str()).or_default().push(idx);
        }

        let mut slots: Vec<Option<FeatureRecord>> = vec![None; records.len()];
        for (commodity, mut indices) in partitions {
            indices.sort_by_key(|&i| records[i].date);

            let mut state = self.new_series();
            for &idx in &indices {
                slots[idx] = Some(state.step(&records[idx]));
            }
            debug!(commodity, rows = indices.len(), "engineered partition");
        }

        let features: Vec<FeatureRecord> = slots.into_iter().flatten().collect();
        info!(rows = features.len(), "engineered features");
        features
    }
}
