//! The lead-time regression model.
//!
//! Kept as small, pure functions so the fitting sweep and the back-test share
//! one definition of the design matrix.

pub mod model;

pub use model::*;
