//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input rows (`TimeSeriesPoint`) and smoothed rows (`SmoothedPoint`)
//! - lead-shifted rows (`LeadRow`)
//! - fit outputs (`FitResult`, `BestFit`, `LinearFit`, report rows)
//! - run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
