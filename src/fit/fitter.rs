//! Low-level fitting routine for a single lead offset.
//!
//! Given the lead rows of one offset:
//! - keep the complete rows (both averages defined)
//! - build the design matrix `[1, cases_sdma, t, …]` with `t` in days since
//!   the earliest date of the dataset
//! - solve OLS and collect adjusted R² plus the coefficient table
//!
//! The result does not depend on row order: rows are sorted by date before
//! the design matrix is built.

use nalgebra::{DMatrix, DVector};

use crate::domain::{CoefficientRow, FitResult, LeadRow, LinearFit, ModelSpec};
use crate::error::LagError;
use crate::math::{fit_ols, OlsFailure};
use crate::models::{day_number, fill_design_row};

/// Minimum complete rows needed to fit `spec` with at least one residual degree of freedom.
///
/// This is `p + 1` (4 for the default model), so an offset with only 3
/// complete rows is skipped: with `n = p` the adjusted R² is `0/0`.
pub fn min_rows(spec: ModelSpec) -> usize {
    spec.param_count() + 1
}

/// Fit the regression for one offset's rows.
///
/// All rows must carry `lead_offset`. Incomplete rows are ignored.
pub fn fit_offset(lead_offset: u32, rows: &[LeadRow], spec: ModelSpec) -> Result<FitResult, LagError> {
    let mut data: Vec<(chrono::NaiveDate, f64, f64)> = rows
        .iter()
        .filter(|r| r.lead_offset == lead_offset)
        .filter_map(|r| r.observation().map(|(c, d)| (r.date, c, d)))
        .collect();
    data.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.total_cmp(&b.2)));

    let required = min_rows(spec);
    if data.len() < required {
        return Err(LagError::InsufficientDataForOffset {
            lead_offset,
            rows: data.len(),
            required,
        });
    }

    let date_origin = data[0].0;
    let train_end = data[data.len() - 1].0;

    let n = data.len();
    let p = spec.param_count();
    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut y = DVector::<f64>::zeros(n);
    let mut row = vec![0.0; p];
    for (i, &(date, cases, deaths)) in data.iter().enumerate() {
        fill_design_row(spec, cases, day_number(date, date_origin), &mut row);
        for j in 0..p {
            x[(i, j)] = row[j];
        }
        y[i] = deaths;
    }

    let summary = fit_ols(&x, &y).map_err(|failure| match failure {
        OlsFailure::TooFewRows { rows, .. } => LagError::InsufficientDataForOffset {
            lead_offset,
            rows,
            required,
        },
        other => LagError::DegenerateFit {
            lead_offset,
            reason: other.to_string(),
        },
    })?;

    let coefficients = spec
        .term_names()
        .into_iter()
        .enumerate()
        .map(|(j, term)| CoefficientRow {
            term,
            estimate: summary.beta[j],
            std_error: summary.std_errors[j],
            statistic: summary.t_values[j],
            p_value: summary.p_values[j],
        })
        .collect();

    let model = LinearFit {
        spec,
        date_origin,
        train_start: date_origin,
        train_end,
        coefficients,
        r_squared: summary.r_squared,
        adjusted_r_squared: summary.adj_r_squared,
        sigma: summary.sigma,
        n_obs: summary.n,
        df_residual: summary.df_residual,
    };

    Ok(FitResult {
        lead_offset,
        adjusted_r_squared: model.adjusted_r_squared,
        model,
    })
}
