//! Record cleaning: validation, outlier rejection and text normalization.

use agri_core::config::{CleaningConfig, OutlierPolicy};
use agri_core::PriceRecord;
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Counts from one clean pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Records offered.
    pub input: usize,
    /// Dropped for a blank commodity or market.
    pub missing_field: usize,
    /// Dropped for a non-finite or negative modal price.
    pub invalid_price: usize,
    /// Dropped by outlier rejection.
    pub outliers: usize,
    /// Records returned.
    pub output: usize,
}

/// Cleaned records plus the counts explaining what was dropped.
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<PriceRecord>,
    pub stats: CleanStats,
}

/// Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TukeyFence {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl TukeyFence {
    /// Compute fences over `values`.
    ///
    /// Returns `None` when there are no values or the IQR is zero, in which
    /// case no rejection should happen.
    pub fn from_values(values: &[f64], k: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by_key(|v| OrderedFloat(*v));

        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        if iqr <= 0.0 {
            return None;
        }

        Some(Self {
            q1,
            q3,
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        })
    }

    /// Whether `value` lies inside the fences (inclusive).
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Quantile of sorted data, interpolating linearly between order statistics
/// at position `(n - 1) * q`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Trim and title-case: the first letter of every alphabetic run is upper
/// case, the rest lower case.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Validates, de-noises and normalizes price records.
#[derive(Debug, Clone)]
pub struct Cleaner {
    policy: OutlierPolicy,
    iqr_multiplier: f64,
}

impl Cleaner {
    /// Create a cleaner from configuration.
    pub fn new(config: &CleaningConfig) -> Self {
        Self {
            policy: config.outlier_policy,
            iqr_multiplier: config.iqr_multiplier,
        }
    }

    /// Clean a table. Output is sorted by (commodity, date); ties keep input
    /// order.
    pub fn clean(&self, records: &[PriceRecord]) -> CleanOutcome {
        let mut stats = CleanStats {
            input: records.len(),
            ..CleanStats::default()
        };

        let present: Vec<&PriceRecord> = records
            .iter()
            .filter(|r| !r.commodity.trim().is_empty() && !r.market.trim().is_empty())
            .collect();
        stats.missing_field = records.len() - present.len();

        let valid: Vec<&PriceRecord> = present
            .iter()
            .copied()
            .filter(|r| r.modal_price.is_finite() && r.modal_price >= 0.0)
            .collect();
        stats.invalid_price = present.len() - valid.len();

        let kept = self.reject_outliers(valid);
        stats.outliers = records.len() - stats.missing_field - stats.invalid_price - kept.len();

        let mut cleaned: Vec<PriceRecord> = kept
            .into_iter()
            .map(|r| PriceRecord {
                commodity: title_case(&r.commodity),
                state: title_case(&r.state),
                market: r.market.trim().to_string(),
                ..r.clone()
            })
            .collect();

        // Vec::sort_by is stable, so equal (commodity, date) keep input order.
        cleaned.sort_by(|a, b| a.commodity.cmp(&b.commodity).then(a.date.cmp(&b.date)));

        stats.output = cleaned.len();
        if cleaned.is_empty() {
            warn!(input = stats.input, "cleaning produced an empty table");
        }
        info!(
            input = stats.input,
            missing_field = stats.missing_field,
            invalid_price = stats.invalid_price,
            outliers = stats.outliers,
            output = stats.output,
            "cleaned records"
        );

        CleanOutcome {
            records: cleaned,
            stats,
        }
    }

    fn reject_outliers<'a>(&self, records: Vec<&'a PriceRecord>) -> Vec<&'a PriceRecord> {
        match self.policy {
            OutlierPolicy::Disabled => records,
            OutlierPolicy::GlobalIqr => {
                let prices: Vec<f64> = records.iter().map(|r| r.modal_price).collect();
                match TukeyFence::from_values(&prices, self.iqr_multiplier) {
                    Some(fence) => {
                        debug!(lower = fence.lower, upper = fence.upper, "global IQR fences");
                        records.into_iter().filter(|r| fence.contains(r.modal_price)).collect()
                    }
                    None => {
                        if !records.is_empty() {
                            warn!("IQR is zero; skipping outlier rejection");
                        }
                        records
                    }
                }
            }
            OutlierPolicy::PerCommodityIqr => {
                let mut prices: HashMap<String, Vec<f64>> = HashMap::new();
                for r in &records {
                    prices.entry(title_case(&r.commodity)).or_default().push(r.modal_price);
                }
                let fences: HashMap<String, Option<TukeyFence>> = prices
                    .into_iter()
                    .map(|(commodity, values)| {
                        let fence = TukeyFence::from_values(&values, self.iqr_multiplier);
                        debug!(%commodity, ?fence, "per-commodity IQR fences");
                        (commodity, fence)
                    })
                    .collect();

                records
                    .into_iter()
                    .filter(|r| match fences.get(&title_case(&r.commodity)) {
                        Some(Some(fence)) => fence.contains(r.modal_price),
                        _ => true,
                    })
                    .collect()
            }
        }
    }
}
