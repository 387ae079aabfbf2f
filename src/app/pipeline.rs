//! Shared analysis pipeline used by every CLI subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> smooth (all regions) -> lead rows -> sweep -> selection -> back-test
//!
//! The CLI then only decides what to print and export.

use chrono::NaiveDate;
use log::info;

use crate::data::{generate_series, smooth_all};
use crate::domain::{AnalysisConfig, BestFit, InputSource, LeadRow, SmoothedPoint};
use crate::error::{AppError, LagError};
use crate::fit::{backtest, build_lead_rows, fit_sweep, select_best, BacktestOutput, SweepOutput};
use crate::io::ingest::{load_csv, IngestFilter, IngestedSeries};

/// Smoothed data for every region plus the resolved target region.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub ingest: IngestedSeries,
    /// Every region's smoothed series, in first-appearance order.
    pub regions: Vec<(String, Vec<SmoothedPoint>)>,
    /// Target region name and its smoothed series.
    pub region: String,
    pub series: Vec<SmoothedPoint>,
    /// Non-fatal smoothing notes (`InsufficientWindow`).
    pub notes: Vec<LagError>,
}

/// All computed outputs of a single `fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedSeries,
    pub regions: Vec<(String, Vec<SmoothedPoint>)>,
    pub region: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub series: Vec<SmoothedPoint>,
    pub lead_rows: Vec<LeadRow>,
    pub sweep: SweepOutput,
    pub best: BestFit,
    pub backtest: BacktestOutput,
    pub notes: Vec<LagError>,
}

/// Load the configured input (CSV or synthetic), applying the date filters.
pub fn load_input(config: &AnalysisConfig) -> Result<IngestedSeries, AppError> {
    let filter = IngestFilter {
        region: None,
        date_from: config.date_from,
        date_to: config.date_to,
    };

    match &config.source {
        InputSource::Csv(path) => load_csv(path, &filter),
        InputSource::Synthetic(synthetic) => {
            let points: Vec<_> = generate_series(synthetic)?
                .into_iter()
                .filter(|p| filter.keeps(p))
                .collect();
            if points.is_empty() {
                return Err(AppError::new(3, "No synthetic rows remain after date filtering."));
            }
            Ok(IngestedSeries::from_points(points))
        }
    }
}

/// Load, smooth every region and pick the target region.
pub fn prepare(config: &AnalysisConfig) -> Result<PreparedData, AppError> {
    config.validate()?;
    let ingest = load_input(config)?;
    prepare_from_ingest(config, ingest)
}

/// Same as [`prepare`] for already-loaded data.
pub fn prepare_from_ingest(config: &AnalysisConfig, ingest: IngestedSeries) -> Result<PreparedData, AppError> {
    let (regions, notes) = smooth_all(&ingest.points, config.window);

    let index = resolve_region(&regions, config.region.as_deref())?;
    let (region, series) = regions[index].clone();
    info!(
        "region {region}: {} day(s), {} with smoothed values",
        series.len(),
        usable_days(&series)
    );

    Ok(PreparedData {
        ingest,
        regions,
        region,
        series,
        notes,
    })
}

/// Execute the full lead-time analysis and return the computed outputs.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let prepared = prepare(config)?;
    analyse(config, prepared)
}

/// Run the lead-time search on prepared data.
pub fn analyse(config: &AnalysisConfig, prepared: PreparedData) -> Result<RunOutput, AppError> {
    let PreparedData {
        ingest,
        regions,
        region,
        series,
        notes,
    } = prepared;

    let (first_date, last_date) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Err(LagError::EmptySeries.into()),
    };

    // 1) Lead-shifted rows for offsets 0..=K.
    let lead_rows = build_lead_rows(&series, config.max_offset)?;
    info!("built {} lead row(s) for offsets 0..={}", lead_rows.len(), config.max_offset);

    // 2) One regression per offset.
    let sweep = fit_sweep(&lead_rows, config.model);

    // 3) Best adjusted R².
    let best = select_best(&sweep.fits, config.max_offset, usable_days(&series))?;

    // 4) Back-test against the observed deaths.
    let backtest = backtest(&best, &series);

    Ok(RunOutput {
        ingest,
        regions,
        region,
        first_date,
        last_date,
        series,
        lead_rows,
        sweep,
        best,
        backtest,
        notes,
    })
}

/// Days with a defined death average.
pub fn usable_days(series: &[SmoothedPoint]) -> usize {
    series.iter().filter(|p| p.deaths_sdma.is_some()).count()
}

fn resolve_region(regions: &[(String, Vec<SmoothedPoint>)], wanted: Option<&str>) -> Result<usize, AppError> {
    match wanted {
        Some(name) => regions
            .iter()
            .position(|(r, _)| r.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!("Region '{name}' not found. Available: {}", region_list(regions)),
                )
            }),
        None if regions.len() == 1 => Ok(0),
        None => Err(AppError::new(
            2,
            format!(
                "Input has {} regions; choose one with `--region`. Available: {}",
                regions.len(),
                region_list(regions)
            ),
        )),
    }
}

fn region_list(regions: &[(String, Vec<SmoothedPoint>)]) -> String {
    let names: Vec<&str> = regions.iter().map(|(r, _)| r.as_str()).collect();
    names.join(", ")
}
