//! Ordinary least squares with classical inference.
//!
//! For every lead offset we solve one small regression problem:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD solve, so a tall design matrix (many days, 3 columns) is handled
//!   directly and near-collinear columns degrade gracefully.
//!   (Nalgebra's `QR::solve` is intended for square systems.)
//! - The coefficient covariance `σ² (XᵀX)⁻¹` is taken from the same SVD as
//!   `σ² V Σ⁻² Vᵀ`, so no explicit normal-equation inverse is formed.
//! - p-values are two-sided Student-t tail probabilities with `n - p` degrees
//!   of freedom.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Relative singular-value cutoff below which the design is treated as rank deficient.
const RANK_TOL: f64 = 1e-10;

/// Coefficients and goodness-of-fit statistics of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsSummary {
    pub beta: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub sse: f64,
    pub tss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub sigma: f64,
    pub n: usize,
    pub df_residual: usize,
}

/// Why an OLS fit could not produce usable statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum OlsFailure {
    /// Need strictly more rows than columns for residual degrees of freedom.
    TooFewRows { rows: usize, cols: usize },
    /// Design matrix does not have full column rank.
    RankDeficient { rank: usize, cols: usize },
    /// The response has zero variance, so R² is undefined.
    ConstantResponse,
    /// Some statistic came out NaN/infinite.
    NonFinite,
}

impl std::fmt::Display for OlsFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OlsFailure::TooFewRows { rows, cols } => {
                write!(f, "{rows} row(s) for {cols} coefficient(s)")
            }
            OlsFailure::RankDeficient { rank, cols } => {
                write!(f, "design matrix has rank {rank} < {cols}")
            }
            OlsFailure::ConstantResponse => write!(f, "response is constant"),
            OlsFailure::NonFinite => write!(f, "non-finite statistic"),
        }
    }
}

/// Fit `y ≈ Xβ` (X includes the intercept column) and compute inference statistics.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsSummary, OlsFailure> {
    let n = x.nrows();
    let p = x.ncols();
    if n <= p {
        return Err(OlsFailure::TooFewRows { rows: n, cols: p });
    }

    let svd = x.clone().svd(true, true);
    let s_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let rank = svd
        .singular_values
        .iter()
        .filter(|&&s| s > RANK_TOL * s_max.max(f64::MIN_POSITIVE))
        .count();
    if rank < p {
        return Err(OlsFailure::RankDeficient { rank, cols: p });
    }

    let beta = svd
        .solve(y, RANK_TOL * s_max)
        .map_err(|_| OlsFailure::RankDeficient { rank, cols: p })?;

    let fitted = x * &beta;
    let sse: f64 = (y - fitted).iter().map(|r| r * r).sum();

    let mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - mean) * (v - mean)).sum();
    if tss <= f64::EPSILON * (1.0 + mean * mean) * n as f64 {
        return Err(OlsFailure::ConstantResponse);
    }

    let df_residual = n - p;
    let r_squared = (1.0 - sse / tss).min(1.0);
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df_residual as f64;
    let sigma2 = sse / df_residual as f64;

    // Var(β̂) = σ² V Σ⁻² Vᵀ; only the diagonal is needed.
    let v_t = svd.v_t.as_ref().ok_or(OlsFailure::NonFinite)?;
    let mut std_errors = Vec::with_capacity(p);
    for j in 0..p {
        let mut var = 0.0;
        for k in 0..p {
            let s = svd.singular_values[k];
            let v = v_t[(k, j)];
            var += (v * v) / (s * s);
        }
        std_errors.push((sigma2 * var).sqrt());
    }

    let beta: Vec<f64> = beta.iter().copied().collect();
    let t_values: Vec<f64> = beta
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values = t_values
        .iter()
        .map(|&t| two_sided_p_value(t, df_residual))
        .collect();

    if !(r_squared.is_finite() && adj_r_squared.is_finite() && beta.iter().all(|b| b.is_finite())) {
        return Err(OlsFailure::NonFinite);
    }

    Ok(OlsSummary {
        beta,
        std_errors,
        t_values,
        p_values,
        sse,
        tss,
        r_squared,
        adj_r_squared,
        sigma: sigma2.sqrt(),
        n,
        df_residual,
    })
}

/// `P(|T| >= |t|)` for a Student-t with `df` degrees of freedom.
///
/// Infinite `t` (an exact fit with zero standard error) gives `0`; `NaN` stays `NaN`.
pub fn two_sided_p_value(t: f64, df: usize) -> f64 {
    if t.is_nan() || df == 0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_has_unit_r_squared() {
        // y = 2 + 3x on x = [0,1,2,3]
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0, 11.0]);

        let fit = fit_ols(&x, &y).unwrap();
        assert!((fit.beta[0] - 2.0).abs() < 1e-10);
        assert!((fit.beta[1] - 3.0).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!(fit.sse < 1e-18);
    }

    #[test]
    fn fit_ols_matches_hand_computed_simple_regression() {
        // x = 1..5, y = [1,3,2,5,4]:
        // slope = 8/10, intercept = 0.6, SSE = 3.6, TSS = 10.
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0, 5.0],
        );
        let y = DVector::from_row_slice(&[1.0, 3.0, 2.0, 5.0, 4.0]);

        let fit = fit_ols(&x, &y).unwrap();
        assert!((fit.beta[0] - 0.6).abs() < 1e-10);
        assert!((fit.beta[1] - 0.8).abs() < 1e-10);
        assert!((fit.sse - 3.6).abs() < 1e-10);
        assert!((fit.r_squared - 0.64).abs() < 1e-10);
        assert!((fit.adj_r_squared - 0.52).abs() < 1e-10);
        assert_eq!(fit.df_residual, 3);

        // se(slope) = sqrt(1.2 / 10), se(intercept) = sqrt(1.2 * (1/5 + 9/10)).
        assert!((fit.std_errors[1] - 0.12_f64.sqrt()).abs() < 1e-10);
        assert!((fit.std_errors[0] - 1.32_f64.sqrt()).abs() < 1e-10);
        assert!((fit.t_values[1] - 0.8 / 0.12_f64.sqrt()).abs() < 1e-9);
        // Two-sided p for t ≈ 2.309 on 3 df is ≈ 0.104.
        assert!((fit.p_values[1] - 0.104).abs() < 0.005, "p = {}", fit.p_values[1]);
    }

    #[test]
    fn fit_ols_rejects_square_system() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        assert_eq!(fit_ols(&x, &y).unwrap_err(), OlsFailure::TooFewRows { rows: 2, cols: 2 });
    }

    #[test]
    fn fit_ols_rejects_collinear_columns() {
        let x = DMatrix::from_row_slice(
            4,
            3,
            &[1.0, 1.0, 2.0, 1.0, 2.0, 4.0, 1.0, 3.0, 6.0, 1.0, 4.0, 8.0],
        );
        let y = DVector::from_row_slice(&[1.0, 2.0, 2.5, 4.0]);
        assert!(matches!(fit_ols(&x, &y), Err(OlsFailure::RankDeficient { .. })));
    }

    #[test]
    fn fit_ols_rejects_constant_response() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[5.0, 5.0, 5.0]);
        assert_eq!(fit_ols(&x, &y).unwrap_err(), OlsFailure::ConstantResponse);
    }

    #[test]
    fn p_value_edges() {
        assert_eq!(two_sided_p_value(f64::INFINITY, 5), 0.0);
        assert!(two_sided_p_value(f64::NAN, 5).is_nan());
        assert!((two_sided_p_value(0.0, 5) - 1.0).abs() < 1e-12);
    }
}
