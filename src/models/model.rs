//! Design rows and prediction for the lead-time regression.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for `(cases_sdma, t)` (for OLS)
//! - predict deaths given fitted coefficients (for the back-test)
//!
//! Column order is `[1, cases_sdma, t, t², …, t^degree]` where `t` is the
//! number of days since the model's date origin.

use chrono::NaiveDate;

use crate::domain::{LinearFit, ModelSpec};

/// Numeric date covariate: whole days since `origin` (negative before it).
pub fn day_number(date: NaiveDate, origin: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Fill a design row for the given model spec.
///
/// The row includes the constant term first (intercept).
///
/// # Panics
/// Panics if `out` does not have length `spec.param_count()`. Callers should
/// size the buffer correctly.
pub fn fill_design_row(spec: ModelSpec, cases_sdma: f64, t: f64, out: &mut [f64]) {
    out[0] = 1.0;
    out[1] = cases_sdma;
    let mut power = 1.0;
    for slot in out[2..2 + spec.date_degree].iter_mut() {
        power *= t;
        *slot = power;
    }
}

/// Evaluate `β0 + β1·cases + Σ βj·t^j`.
pub fn predict(spec: ModelSpec, cases_sdma: f64, t: f64, betas: &[f64]) -> f64 {
    let mut y = betas[0] + betas[1] * cases_sdma;
    let mut power = 1.0;
    for beta in &betas[2..2 + spec.date_degree] {
        power *= t;
        y += beta * power;
    }
    y
}

impl LinearFit {
    /// Coefficient estimates in design order.
    pub fn betas(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }

    /// Predicted led deaths for a case average observed on `date`.
    pub fn predict(&self, cases_sdma: f64, date: NaiveDate) -> f64 {
        let t = day_number(date, self.date_origin);
        predict(self.spec, cases_sdma, t, &self.betas())
    }
}
