//! Mathematical utilities: trailing averages and least squares.

pub mod ols;
pub mod rolling;

pub use ols::*;
pub use rolling::*;
