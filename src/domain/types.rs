//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages by value
//! - exported to CSV/JSON reports
//! - constructed directly in tests

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LagError;

/// Default upper bound of the lead-offset sweep (days).
pub const DEFAULT_MAX_OFFSET: u32 = 30;

/// Trailing window of the smoothed series (days).
pub const SMOOTHING_WINDOW: usize = 7;

/// A raw daily observation for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub region: String,
    pub date: NaiveDate,
    /// New cases reported that day.
    pub case_count: f64,
    /// New deaths reported that day.
    pub death_count: f64,
}

/// A daily observation after smoothing.
///
/// `None` means "not yet available" (inside the warm-up window), never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    pub region: String,
    pub date: NaiveDate,
    pub cases_sdma: Option<f64>,
    pub deaths_sdma: Option<f64>,
}

/// Case average observed on `date` paired with the death average observed
/// `lead_offset` days later.
///
/// Rows are only built where `date + lead_offset` is inside the observed range.
/// Either side may still be missing because of the smoothing warm-up; such a
/// row is kept for accounting but is not usable for fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRow {
    pub date: NaiveDate,
    pub cases_sdma: Option<f64>,
    pub lead_offset: u32,
    pub led_deaths: Option<f64>,
}

impl LeadRow {
    /// `(cases_sdma, led_deaths)` when both are defined.
    pub fn observation(&self) -> Option<(f64, f64)> {
        match (self.cases_sdma, self.led_deaths) {
            (Some(c), Some(d)) if c.is_finite() && d.is_finite() => Some((c, d)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.observation().is_some()
    }
}

/// Structure of the regression `led_deaths ~ cases_sdma + poly(date, degree)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Polynomial degree of the date term (1 = linear trend).
    pub date_degree: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self { date_degree: 1 }
    }
}

impl ModelSpec {
    /// Number of linear coefficients (intercept + cases + date terms).
    pub fn param_count(self) -> usize {
        2 + self.date_degree
    }

    /// Coefficient labels, in design-matrix column order.
    pub fn term_names(self) -> Vec<String> {
        let mut names = vec!["(Intercept)".to_string(), "cases_sdma".to_string()];
        for power in 1..=self.date_degree {
            if power == 1 {
                names.push("date".to_string());
            } else {
                names.push(format!("date^{power}"));
            }
        }
        names
    }
}

/// One row of a coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRow {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
}

/// A fitted linear model for one lead offset.
///
/// Downstream stages only predict with it and read its coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub spec: ModelSpec,
    /// Day zero of the numeric date covariate.
    pub date_origin: NaiveDate,
    /// First and last case-observation dates used in training.
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub coefficients: Vec<CoefficientRow>,
    pub r_squared: f64,
    pub adjusted_r_squared: f64,
    /// Residual standard error.
    pub sigma: f64,
    pub n_obs: usize,
    pub df_residual: usize,
}

/// Output of fitting a single lead offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub lead_offset: u32,
    pub model: LinearFit,
    pub adjusted_r_squared: f64,
}

/// The selected lead offset and its model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestFit {
    pub lead_offset: u32,
    pub model: LinearFit,
    pub adjusted_r_squared: f64,
}

impl From<FitResult> for BestFit {
    fn from(fit: FitResult) -> Self {
        Self {
            lead_offset: fit.lead_offset,
            model: fit.model,
            adjusted_r_squared: fit.adjusted_r_squared,
        }
    }
}

/// An offset that could not be fitted, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOffset {
    pub lead_offset: u32,
    pub reason: LagError,
}

/// Fit quality per offset (for charting adjusted R² against the offset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetSummary {
    pub lead_offset: u32,
    pub adjusted_r_squared: f64,
    pub n_obs: usize,
}

/// Actual vs predicted smoothed deaths on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub actual_deaths_sdma: Option<f64>,
    pub predicted_deaths: Option<f64>,
}

/// Where the analysed series comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Csv(PathBuf),
    Synthetic(SyntheticConfig),
}

/// Parameters of the deterministic synthetic series generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub region: String,
    pub start: NaiveDate,
    pub days: usize,
    /// True case-to-death delay (days).
    pub lag: u32,
    pub fatality_ratio: f64,
    /// Standard deviation of the Gaussian noise, relative to the daily level.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            region: "Synthetica".to_string(),
            start: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap_or_default(),
            days: 180,
            lag: 19,
            fatality_ratio: 0.02,
            noise: 0.0,
            seed: 42,
        }
    }
}

/// Terminal output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Summary, sweep table, coefficients and comparison head/tail.
    Full,
    /// Per-offset table only.
    Sweep,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub source: InputSource,
    /// Region to run the lead-time search for. `None` picks the only region
    /// present, or fails if there are several.
    pub region: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,

    pub max_offset: u32,
    pub model: ModelSpec,
    pub window: usize,

    /// Comparison rows printed from each end of the table.
    pub preview_rows: usize,

    pub export_sweep: Option<PathBuf>,
    pub export_coefficients: Option<PathBuf>,
    pub export_comparison: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
    pub export_smoothed: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source: InputSource::Synthetic(SyntheticConfig::default()),
            region: None,
            date_from: None,
            date_to: None,
            max_offset: DEFAULT_MAX_OFFSET,
            model: ModelSpec::default(),
            window: SMOOTHING_WINDOW,
            preview_rows: 5,
            export_sweep: None,
            export_coefficients: None,
            export_comparison: None,
            export_summary: None,
            export_smoothed: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), LagError> {
        if self.model.date_degree == 0 {
            return Err(LagError::InvalidConfig("date degree must be >= 1".to_string()));
        }
        if self.window == 0 {
            return Err(LagError::InvalidConfig("smoothing window must be >= 1".to_string()));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(LagError::InvalidConfig(format!(
                    "date floor {from} is after date ceiling {to}"
                )));
            }
        }
        if let InputSource::Synthetic(cfg) = &self.source {
            if cfg.days == 0 {
                return Err(LagError::InvalidConfig("synthetic series needs at least one day".to_string()));
            }
            if !(cfg.fatality_ratio.is_finite() && cfg.fatality_ratio >= 0.0) {
                return Err(LagError::InvalidConfig("fatality ratio must be finite and >= 0".to_string()));
            }
            if !(cfg.noise.is_finite() && cfg.noise >= 0.0) {
                return Err(LagError::InvalidConfig("noise must be finite and >= 0".to_string()));
            }
        }
        Ok(())
    }
}
