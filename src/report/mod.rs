//! Terminal reports: run summary, sweep table, coefficients, comparison preview
//! and the per-region overview.

pub mod format;

pub use format::*;
