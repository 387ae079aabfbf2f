//! Lead-time search orchestration.
//!
//! Responsibilities:
//!
//! - build lead-shifted rows for offsets `0..=K`
//! - fit one regression per offset (parallel)
//! - select the offset with the best adjusted R²
//! - back-test the selected model against the observed deaths

pub mod backtest;
pub mod fitter;
pub mod lead;
pub mod selection;

pub use backtest::*;
pub use fitter::*;
pub use lead::*;
pub use selection::*;
