//! Raw row parsing.
//!
//! Turns untyped source rows into [`PriceRecord`]s. Rows that cannot be parsed
//! are dropped and counted by reason; nothing here returns an error for a bad
//! row.

use crate::table::{non_blank, RawRow};
use agri_core::{Error, PriceRecord, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

/// Date-only formats accepted in source tables.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Date-time formats accepted in source tables (time is discarded).
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Counts from one ingest pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Rows offered.
    pub total_rows: usize,
    /// Rows turned into records.
    pub accepted: usize,
    /// Rows missing commodity, market or modal price.
    pub missing_field: usize,
    /// Rows whose date was missing or unparsable.
    pub bad_date: usize,
    /// Rows whose modal price was not a finite number.
    pub bad_price: usize,
}

impl IngestStats {
    /// Rows dropped for any reason.
    pub fn dropped(&self) -> usize {
        self.missing_field + self.bad_date + self.bad_price
    }
}

/// Records plus the counts explaining what was dropped.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub records: Vec<PriceRecord>,
    pub stats: IngestStats,
}

/// Parses raw rows into typed price records.
#[derive(Debug, Clone, Default)]
pub struct RecordIngestor;

impl RecordIngestor {
    /// Create a new ingestor.
    pub fn new() -> Self {
        Self
    }

    /// Parse every row, keeping input order for the rows that survive.
    pub fn ingest(&self, rows: &[RawRow]) -> IngestOutcome {
        let mut stats = IngestStats {
            total_rows: rows.len(),
            ..IngestStats::default()
        };
        let mut records = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let (Some(commodity), Some(market), Some(price_text)) = (
                non_blank(row.commodity.as_deref()),
                non_blank(row.market.as_deref()),
                non_blank(row.modal_price.as_deref()),
            ) else {
                stats.missing_field += 1;
                continue;
            };

            let date = match row.date_text().map(parse_date) {
                Some(Ok(date)) => date,
                Some(Err(err)) => {
                    debug!(row = idx, %err, "dropping row");
                    stats.bad_date += 1;
                    continue;
                }
                None => {
                    stats.bad_date += 1;
                    continue;
                }
            };

            let modal_price = match parse_price(price_text) {
                Ok(price) => price,
                Err(err) => {
                    debug!(row = idx, %err, "dropping row");
                    stats.bad_price += 1;
                    continue;
                }
            };

            records.push(PriceRecord {
                commodity: commodity.to_string(),
                state: row.state.as_deref().map(str::trim).unwrap_or_default().to_string(),
                market: market.to_string(),
                date,
                modal_price,
                min_price: non_blank(row.min_price.as_deref()).and_then(|s| parse_price(s).ok()),
                max_price: non_blank(row.max_price.as_deref()).and_then(|s| parse_price(s).ok()),
            });
        }

        stats.accepted = records.len();
        if stats.dropped() > 0 {
            warn!(
                dropped = stats.dropped(),
                missing_field = stats.missing_field,
                bad_date = stats.bad_date,
                bad_price = stats.bad_price,
                "dropped unparsable rows"
            );
        }
        info!(total = stats.total_rows, accepted = stats.accepted, "ingested rows");

        IngestOutcome { records, stats }
    }
}

/// Parse a date in any of the accepted source formats.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Ok(date);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Ok(dt.date());
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.date_naive())
        .map_err(|_| Error::parse(format!("unrecognized date '{text}'")))
}

/// Parse a price, tolerating surrounding whitespace and thousands separators.
pub fn parse_price(text: &str) -> Result<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned
        .parse()
        .map_err(|_| Error::parse(format!("not a number: '{text}'")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::parse(format!("not a finite number: '{text}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(commodity: &str, market: &str, date: &str, price: &str) -> RawRow {
        RawRow {
            commodity: Some(commodity.to_string()),
            state: Some("Punjab".to_string()),
            market: Some(market.to_string()),
            arrival_date: Some(date.to_string()),
            date: None,
            modal_price: Some(price.to_string()),
            min_price: None,
            max_price: None,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date("2024-03-07").unwrap(), expected);
        assert_eq!(parse_date("07/03/2024").unwrap(), expected);
        assert_eq!(parse_date("07-03-2024").unwrap(), expected);
        assert_eq!(parse_date("2024/03/07").unwrap(), expected);
        assert_eq!(parse_date("2024-03-07 13:45:00").unwrap(), expected);
        assert_eq!(parse_date("2024-03-07T23:59:59+05:30").unwrap(), expected);
        assert!(matches!(parse_date("yesterday"), Err(Error::Parse(_))));
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(" 2100.5 ").unwrap(), 2100.5);
        assert_eq!(parse_price("1,250").unwrap(), 1250.0);
        assert!(parse_price("n/a").is_err());
        assert!(parse_price("NaN").is_err());
        assert!(parse_price("inf").is_err());
    }

    #[test]
    fn test_ingest_drops_and_counts() {
        let rows = vec![
            row("Wheat", "Mandi", "2024-01-01", "2000"),
            row("", "Mandi", "2024-01-01", "2000"),
            row("Wheat", "Mandi", "not a date", "2000"),
            row("Wheat", "Mandi", "2024-01-02", "abc"),
            RawRow {
                market: None,
                ..row("Rice", "x", "2024-01-01", "10")
            },
            row("Rice", "APMC", "02/01/2024", "2,500"),
        ];

        let outcome = RecordIngestor::new().ingest(&rows);

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.stats,
            IngestStats {
                total_rows: 6,
                accepted: 2,
                missing_field: 2,
                bad_date: 1,
                bad_price: 1,
            }
        );
        assert_eq!(outcome.stats.dropped(), 4);
        assert_eq!(outcome.records[1].commodity, "Rice");
        assert_eq!(outcome.records[1].modal_price, 2500.0);
        assert_eq!(outcome.records[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_ingest_optional_range() {
        let mut raw = row("Tomato", "Mandi", "2024-05-01", "30");
        raw.min_price = Some("27".to_string());
        raw.max_price = Some("??".to_string());

        let outcome = RecordIngestor::new().ingest(&[raw]);
        let record = &outcome.records[0];
        assert_eq!(record.min_price, Some(27.0));
        assert_eq!(record.max_price, None);
    }

    #[test]
    fn test_ingest_missing_date_column() {
        let mut raw = row("Tomato", "Mandi", "", "30");
        raw.arrival_date = None;
        let outcome = RecordIngestor::new().ingest(&[raw]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.bad_date, 1);
    }

    #[test]
    fn test_ingest_empty() {
        let outcome = RecordIngestor::new().ingest(&[]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats, IngestStats::default());
    }
}
