//! Export report tables to CSV.
//!
//! Every table is written with a header row; missing values are empty cells.

use std::path::Path;

use serde::Serialize;

use crate::domain::{CoefficientRow, ComparisonRow, OffsetSummary, SmoothedPoint, TimeSeriesPoint};
use crate::error::AppError;

/// Write per-offset fit quality (`lead_offset,adjusted_r_squared,n_obs`).
pub fn write_sweep_csv(path: &Path, rows: &[OffsetSummary]) -> Result<(), AppError> {
    write_rows(path, rows, "sweep")
}

/// Write the selected model's coefficient table.
pub fn write_coefficients_csv(path: &Path, rows: &[CoefficientRow]) -> Result<(), AppError> {
    write_rows(path, rows, "coefficients")
}

/// Write the actual-vs-predicted comparison table.
pub fn write_comparison_csv(path: &Path, rows: &[ComparisonRow]) -> Result<(), AppError> {
    write_rows(path, rows, "comparison")
}

/// Write a smoothed series.
pub fn write_smoothed_csv(path: &Path, rows: &[SmoothedPoint]) -> Result<(), AppError> {
    write_rows(path, rows, "smoothed series")
}

/// Write raw daily points in the layout `ingest` reads back.
pub fn write_series_csv(path: &Path, rows: &[TimeSeriesPoint]) -> Result<(), AppError> {
    write_rows(path, rows, "series")
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T], what: &str) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::new(2, format!("Failed to create {what} CSV '{}': {e}", path.display()))
    })?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write {what} CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush {what} CSV: {e}")))?;
    Ok(())
}
