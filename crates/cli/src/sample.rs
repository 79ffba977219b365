//! Synthetic raw price tables for demos and smoke runs.

use agri_core::Result;
use agri_ingestion::{write_csv, RawRow};
use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::info;

/// Commodities and their base modal prices.
const COMMODITIES: [(&str, f64); 7] = [
    ("Wheat", 2000.0),
    ("Rice", 2500.0),
    ("Tomato", 30.0),
    ("Onion", 25.0),
    ("Potato", 20.0),
    ("Cotton", 5000.0),
    ("Sugarcane", 300.0),
];

const STATES: [&str; 6] = [
    "Punjab",
    "Haryana",
    "Maharashtra",
    "Karnataka",
    "Tamil Nadu",
    "Uttar Pradesh",
];

const MARKETS: [&str; 4] = ["APMC Market", "Mandi", "Wholesale Market", "Agricultural Market"];

/// Days of history covered by a generated table.
const HISTORY_DAYS: i64 = 180;

/// Random swing around the base price, as a fraction.
const PRICE_SWING: f64 = 0.3;

/// Generates raw rows shaped like a mandi price feed.
pub struct SampleGenerator {
    rng: StdRng,
}

impl SampleGenerator {
    /// Seeded generator; `None` draws a seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Generate `rows` rows dated from 180 days before `end` up to `end`.
    pub fn generate(&mut self, rows: usize, end: NaiveDate) -> Vec<RawRow> {
        (0..rows).map(|_| self.row(end)).collect()
    }

    fn row(&mut self, end: NaiveDate) -> RawRow {
        let (commodity, base) = COMMODITIES[self.rng.gen_range(0..COMMODITIES.len())];
        let state = STATES[self.rng.gen_range(0..STATES.len())];
        let market = MARKETS[self.rng.gen_range(0..MARKETS.len())];
        let date = end - Duration::days(self.rng.gen_range(0..=HISTORY_DAYS));

        let modal = round2(base * (1.0 + self.rng.gen_range(-PRICE_SWING..PRICE_SWING)));

        RawRow {
            commodity: Some(commodity.to_string()),
            state: Some(state.to_string()),
            market: Some(market.to_string()),
            arrival_date: Some(date.format("%Y-%m-%d").to_string()),
            date: None,
            modal_price: Some(format!("{modal:.2}")),
            min_price: Some(format!("{:.2}", round2(modal * 0.9))),
            max_price: Some(format!("{:.2}", round2(modal * 1.1))),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write a timestamped sample table into `raw_dir` and return its path.
pub fn write_sample(raw_dir: &Path, rows: usize, seed: Option<u64>) -> Result<PathBuf> {
    let now = Local::now();
    let records = SampleGenerator::new(seed).generate(rows, now.date_naive());

    let path = raw_dir.join(format!("commodity_prices_{}.csv", now.format("%Y%m%d_%H%M%S")));
    write_csv(&path, &records)?;

    info!(rows = records.len(), path = %path.display(), "wrote sample table");
    Ok(path)
}
