//! Write a JSON summary of one analysis run.
//!
//! The summary is a report for downstream tooling: the chosen offset, its
//! coefficient table, the per-offset fit quality and anything that was
//! skipped or flagged. It is never read back.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, CoefficientRow, OffsetSummary};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub region: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub max_offset: u32,
    pub date_degree: usize,
    pub lead_offset: u32,
    pub adjusted_r_squared: f64,
    pub r_squared: f64,
    pub n_obs: usize,
    pub coefficients: Vec<CoefficientRow>,
    pub sweep: Vec<OffsetSummary>,
    pub skipped: Vec<SkippedEntry>,
    pub backtest_rmse: Option<f64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub lead_offset: u32,
    pub reason: String,
}

impl RunSummary {
    pub fn from_run(run: &RunOutput, config: &AnalysisConfig) -> Self {
        let best = &run.best;
        let mut warnings: Vec<String> = run.notes.iter().map(ToString::to_string).collect();
        if let Some(w) = &run.backtest.warning {
            warnings.push(w.to_string());
        }

        Self {
            tool: "covid-lag".to_string(),
            region: run.region.clone(),
            first_date: run.first_date,
            last_date: run.last_date,
            max_offset: config.max_offset,
            date_degree: config.model.date_degree,
            lead_offset: best.lead_offset,
            adjusted_r_squared: best.adjusted_r_squared,
            r_squared: best.model.r_squared,
            n_obs: best.model.n_obs,
            coefficients: best.model.coefficients.clone(),
            sweep: run.sweep.summary(),
            skipped: run
                .sweep
                .skipped
                .iter()
                .map(|s| SkippedEntry {
                    lead_offset: s.lead_offset,
                    reason: s.reason.to_string(),
                })
                .collect(),
            backtest_rmse: run.backtest.rmse(),
            warnings,
        }
    }
}

/// Write the run summary JSON.
pub fn write_summary_json(path: &Path, run: &RunOutput, config: &AnalysisConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &RunSummary::from_run(run, config))
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}
