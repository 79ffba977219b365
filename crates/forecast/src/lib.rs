//! Short-horizon price forecasting for the agrisense pipeline.
//!
//! This crate provides:
//! - Closed-form least-squares trend lines over positional indices
//! - Per-commodity extrapolation over a fixed calendar horizon

pub mod linear;
pub mod forecaster;

pub use linear::fit_line;
pub use forecaster::Forecaster;
