//! Lead-offset sweep and model selection.
//!
//! The sweep fits one regression per offset and records:
//! - the fitted model and its adjusted R² (eligible offsets)
//! - the reason an offset could not be fitted (skipped offsets)
//!
//! Selection rules:
//! 1. Skipped offsets are never eligible.
//! 2. Choose the maximum adjusted R².
//! 3. On an exact tie, the lowest offset wins.
//! 4. No eligible offset is an error (`NoFittableModel`).

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{BestFit, FitResult, LeadRow, ModelSpec, OffsetSummary, SkippedOffset};
use crate::error::LagError;
use crate::fit::fitter::fit_offset;
use crate::fit::lead::group_by_offset;

/// Output of the fitting sweep.
#[derive(Debug, Clone)]
pub struct SweepOutput {
    /// Eligible fits, ascending by offset.
    pub fits: Vec<FitResult>,
    /// Offsets that were skipped and why, ascending by offset.
    pub skipped: Vec<SkippedOffset>,
}

impl SweepOutput {
    /// `(lead_offset, adjusted_r_squared, n_obs)` per eligible offset.
    pub fn summary(&self) -> Vec<OffsetSummary> {
        self.fits
            .iter()
            .map(|f| OffsetSummary {
                lead_offset: f.lead_offset,
                adjusted_r_squared: f.adjusted_r_squared,
                n_obs: f.model.n_obs,
            })
            .collect()
    }
}

/// Fit every offset present in `rows` (in parallel).
///
/// Never fails as a whole: offsets that cannot be fitted end up in
/// `SweepOutput::skipped`. Output order is by offset regardless of which fit
/// finishes first.
pub fn fit_sweep(rows: &[LeadRow], spec: ModelSpec) -> SweepOutput {
    let groups: Vec<(u32, Vec<LeadRow>)> = group_by_offset(rows).into_iter().collect();

    let mut results: Vec<(u32, Result<FitResult, LagError>)> = groups
        .par_iter()
        .map(|(lead_offset, group)| (*lead_offset, fit_offset(*lead_offset, group, spec)))
        .collect();
    results.sort_by_key(|(lead_offset, _)| *lead_offset);

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for (lead_offset, result) in results {
        match result {
            Ok(fit) => {
                debug!(
                    "lead offset {lead_offset}: adj R² = {:.6} (n = {})",
                    fit.adjusted_r_squared, fit.model.n_obs
                );
                fits.push(fit);
            }
            Err(reason) => {
                warn!("skipping {reason}");
                skipped.push(SkippedOffset { lead_offset, reason });
            }
        }
    }

    SweepOutput { fits, skipped }
}

/// Pick the fit with the maximum adjusted R².
///
/// Scans in the given order and only replaces the incumbent on a strictly
/// greater value, so an exact tie keeps the earlier (lower) offset when fits
/// are ordered by offset. `max_offset`/`usable_days` only feed the error message.
pub fn select_best(fits: &[FitResult], max_offset: u32, usable_days: usize) -> Result<BestFit, LagError> {
    let mut best: Option<&FitResult> = None;
    for fit in fits {
        if !fit.adjusted_r_squared.is_finite() {
            continue;
        }
        match best {
            Some(b) if fit.adjusted_r_squared > b.adjusted_r_squared => best = Some(fit),
            Some(b) if fit.adjusted_r_squared == b.adjusted_r_squared && fit.lead_offset < b.lead_offset => {
                best = Some(fit)
            }
            None => best = Some(fit),
            _ => {}
        }
    }

    let best = best.ok_or(LagError::NoFittableModel {
        max_offset,
        usable_days,
    })?;
    info!(
        "selected lead offset {} (adj R² = {:.6})",
        best.lead_offset, best.adjusted_r_squared
    );
    Ok(BestFit::from(best.clone()))
}
