//! Feature computation for the agrisense pipeline.
//!
//! This crate handles:
//! - Trailing rolling means and standard deviation per commodity
//! - Percent change, deviation from averages and trend labels
//! - Calendar fields
//! - Ranked summary insights over a featured table

pub mod rolling;
pub mod engine;
pub mod insights;

pub use rolling::RollingWindow;
pub use engine::FeatureEngine;
pub use insights::{InsightAggregator, InsightReport, RankedEntry};
