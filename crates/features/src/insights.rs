//! Ranked summary views over a featured table.

use agri_core::config::InsightConfig;
use agri_core::FeatureRecord;
use chrono::{Duration, NaiveDate};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// One row of a ranking: a commodity or state and its aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub value: f64,
}

/// Read-only summary of a featured table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    /// Commodities by mean modal price, highest first.
    pub top_by_price: Vec<RankedEntry>,
    /// Commodities by mean volatility, highest first.
    pub top_by_volatility: Vec<RankedEntry>,
    /// States by mean modal price, highest first.
    pub top_states_by_price: Vec<RankedEntry>,
    /// Commodities by mean percent change over the recent window, highest first.
    pub recent_trends: Vec<RankedEntry>,
    /// Latest date in the table.
    pub latest_date: Option<NaiveDate>,
    pub record_count: usize,
    pub commodity_count: usize,
}

/// Builds [`InsightReport`]s.
pub struct InsightAggregator {
    top_k: usize,
    recent_days: i64,
    recent_top: usize,
}

impl InsightAggregator {
    /// Create an aggregator from configuration.
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            top_k: config.top_k,
            recent_days: config.recent_days,
            recent_top: config.recent_top,
        }
    }

    /// Summarize a featured table.
    pub fn summarize(&self, features: &[FeatureRecord]) -> InsightReport {
        let Some(latest_date) = features.iter().map(|f| f.date).max() else {
            warn!("no features to summarize");
            return InsightReport::default();
        };

        let cutoff = Duration::try_days(self.recent_days)
            .and_then(|span| latest_date.checked_sub_signed(span))
            .unwrap_or_else(|| {
                warn!(recent_days = self.recent_days, "recent window out of date range; clamping");
                if self.recent_days >= 0 {
                    NaiveDate::MIN
                } else {
                    NaiveDate::MAX
                }
            });
        let recent = features.iter().filter(|f| f.date >= cutoff);
        // Rows without a state stay in the commodity views only.
        let with_state = features.iter().filter(|f| !f.state.trim().is_empty());

        let report = InsightReport {
            top_by_price: rank_by_mean(features.iter(), |f| &f.commodity, |f| f.modal_price, self.top_k),
            top_by_volatility: rank_by_mean(features.iter(), |f| &f.commodity, |f| f.volatility, self.top_k),
            top_states_by_price: rank_by_mean(with_state, |f| &f.state, |f| f.modal_price, self.top_k),
            recent_trends: rank_by_mean(recent, |f| &f.commodity, |f| f.pct_change, self.recent_top),
            latest_date: Some(latest_date),
            record_count: features.len(),
            commodity_count: features
                .iter()
                .map(|f| f.commodity.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
        };

        info!(
            records = report.record_count,
            commodities = report.commodity_count,
            %latest_date,
            "summarized features"
        );
        report
    }
}

/// Group by `key`, take the mean of `value` per group, and return the top
/// `k` groups by mean descending (ties by name ascending).
fn rank_by_mean<'a, I, K, V>(rows: I, key: K, value: V, k: usize) -> Vec<RankedEntry>
where
    I: Iterator<Item = &'a FeatureRecord>,
    K: Fn(&'a FeatureRecord) -> &'a String,
    V: Fn(&FeatureRecord) -> f64,
{
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row).as_str()).or_default().push(value(row));
    }

    let mut ranked: Vec<RankedEntry> = groups
        .into_iter()
        .map(|(name, values)| RankedEntry {
            name: name.to_string(),
            value: statrs::statistics::Statistics::mean(values.iter()),
        })
        .collect();

    // Stable sort over name-ordered groups keeps ties in name order.
    ranked.sort_by_key(|e| Reverse(OrderedFloat(e.value)));
    ranked.truncate(k);
    ranked
}
