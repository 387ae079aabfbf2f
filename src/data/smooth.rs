//! Per-region trailing moving averages of daily cases and deaths.
//!
//! Windows never cross region boundaries: points are grouped by region first
//! (regions keep their first-appearance order) and sorted by date within the
//! region before windowing.

use std::collections::HashMap;

use log::warn;

use crate::domain::{SmoothedPoint, TimeSeriesPoint};
use crate::error::LagError;
use crate::math::trailing_mean;

/// Smooth one region's date-ordered series.
///
/// The first `window - 1` points are `None`. Fewer than `window` points is
/// not an error: every value stays missing.
pub fn smooth_region(points: &[TimeSeriesPoint], window: usize) -> Vec<SmoothedPoint> {
    let cases: Vec<f64> = points.iter().map(|p| p.case_count).collect();
    let deaths: Vec<f64> = points.iter().map(|p| p.death_count).collect();

    let cases_sdma = trailing_mean(&cases, window);
    let deaths_sdma = trailing_mean(&deaths, window);

    points
        .iter()
        .zip(cases_sdma.into_iter().zip(deaths_sdma))
        .map(|(p, (c, d))| SmoothedPoint {
            region: p.region.clone(),
            date: p.date,
            cases_sdma: c,
            deaths_sdma: d,
        })
        .collect()
}

/// Smooth every region in `points`.
///
/// Returns the regions in first-appearance order, each date-ascending, plus
/// an `InsufficientWindow` note for every region too short to produce any
/// value (also logged).
pub fn smooth_all(
    points: &[TimeSeriesPoint],
    window: usize,
) -> (Vec<(String, Vec<SmoothedPoint>)>, Vec<LagError>) {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<&str, Vec<TimeSeriesPoint>> = HashMap::new();
    for p in points {
        let group = groups.entry(p.region.as_str()).or_insert_with(|| {
            order.push(p.region.clone());
            Vec::new()
        });
        group.push(p.clone());
    }

    let mut out = Vec::with_capacity(order.len());
    let mut notes = Vec::new();
    for region in order {
        let mut rows = groups.remove(region.as_str()).unwrap_or_default();
        rows.sort_by_key(|p| p.date);

        if rows.len() < window {
            let note = LagError::InsufficientWindow {
                region: region.clone(),
                observations: rows.len(),
                window,
            };
            warn!("{note}");
            notes.push(note);
        }

        let smoothed = smooth_region(&rows, window);
        out.push((region, smoothed));
    }

    (out, notes)
}
