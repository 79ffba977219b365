//! Flat CSV tables in and out of the pipeline.
//!
//! Raw tables are read leniently: unknown columns are ignored, missing columns
//! become `None`, and records the CSV layer cannot decode are counted and
//! skipped. Processed tables are read and written strictly.

use agri_core::{Columns, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// An untyped row from a raw source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub commodity: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub arrival_date: Option<String>,
    pub date: Option<String>,
    pub modal_price: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl Columns for RawRow {
    const COLUMNS: &'static [&'static str] = &[
        "commodity",
        "state",
        "market",
        "arrival_date",
        "date",
        "modal_price",
        "min_price",
        "max_price",
    ];
}

impl RawRow {
    /// The row's date text: `arrival_date` if present, else `date`.
    pub fn date_text(&self) -> Option<&str> {
        non_blank(self.arrival_date.as_deref()).or_else(|| non_blank(self.date.as_deref()))
    }
}

/// Trimmed text, or `None` if blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Rows read from a raw table.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Decoded rows, in file order.
    pub rows: Vec<RawRow>,
    /// Records the CSV layer could not decode.
    pub malformed: usize,
}

/// Read a raw price table with a header row.
///
/// Only an unreadable file or header is an error.
pub fn read_raw_csv(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    reader.headers()?;

    let mut table = RawTable::default();
    for (line, result) in reader.deserialize::<RawRow>().enumerate() {
        match result {
            Ok(row) => table.rows.push(row),
            Err(err) => {
                debug!(line = line + 2, %err, "skipping malformed record");
                table.malformed += 1;
            }
        }
    }

    if table.malformed > 0 {
        warn!(path = %path.display(), malformed = table.malformed, "raw table had undecodable records");
    }
    info!(path = %path.display(), rows = table.rows.len(), "read raw table");
    Ok(table)
}

/// Read a processed table (clean or featured) written by [`write_csv`].
pub fn read_csv<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// Write rows as a CSV table, creating parent directories as needed.
///
/// The header comes from the field names of `T`. An empty slice still writes
/// the header row.
pub fn write_csv<T: Serialize + Columns>(path: impl AsRef<Path>, rows: &[T]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(T::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(rows.len())
}
