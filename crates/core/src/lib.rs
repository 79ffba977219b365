//! Core types and configuration for the agrisense price pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Price and feature records
//! - Forecast results
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use types::*;
