//! Series preparation: synthetic generation and smoothing.

pub mod sample;
pub mod smooth;

pub use sample::{generate_series, wave_cases};
pub use smooth::{smooth_all, smooth_region};
