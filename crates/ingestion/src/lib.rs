//! Data ingestion and cleaning for the agrisense pipeline.
//!
//! This crate handles:
//! - Reading raw and processed CSV tables
//! - Parsing raw rows into typed price records
//! - Validating and normalizing records
//! - Outlier rejection (Tukey IQR fences)

pub mod table;
pub mod ingestor;
pub mod cleaner;

pub use table::{read_csv, read_raw_csv, write_csv, RawRow, RawTable};
pub use ingestor::{IngestOutcome, IngestStats, RecordIngestor};
pub use cleaner::{title_case, CleanOutcome, CleanStats, Cleaner};
