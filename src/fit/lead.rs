//! Lead-series construction.
//!
//! For each offset `k` in `0..=K`, the death average observed on `date + k` is
//! attached to the case average observed on `date`. Rows are only produced
//! where `date + k` is inside the observed range; the tail of the series is
//! dropped for large offsets rather than imputed.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::domain::{LeadRow, SmoothedPoint};
use crate::error::LagError;

/// Date of the death observation paired with a case observation on `date`.
///
/// Every alignment in the crate (lead rows and back-test) goes through this.
pub fn death_date(date: NaiveDate, lead_offset: u32) -> NaiveDate {
    date + Duration::days(i64::from(lead_offset))
}

/// Check that `series` is one region with strictly ascending, gap-free daily dates.
///
/// Region and ordering are checked over the whole series before gaps, so an
/// out-of-order pair is reported as `UnorderedDates` rather than a gap.
pub fn validate_series(series: &[SmoothedPoint]) -> Result<(), LagError> {
    let first = series.first().ok_or(LagError::EmptySeries)?;
    for w in series.windows(2) {
        let (prev, next) = (&w[0], &w[1]);
        if next.region != first.region {
            return Err(LagError::MixedRegions {
                first: first.region.clone(),
                other: next.region.clone(),
            });
        }
        if next.date <= prev.date {
            return Err(LagError::UnorderedDates {
                previous: prev.date,
                next: next.date,
            });
        }
    }
    for w in series.windows(2) {
        let (prev, next) = (&w[0], &w[1]);
        if next.date != prev.date + Duration::days(1) {
            return Err(LagError::MissingDays {
                previous: prev.date,
                next: next.date,
            });
        }
    }
    Ok(())
}

/// Build lead rows for offsets `0..=max_offset`.
///
/// Output is offset-major (all `k = 0` rows, then `k = 1`, …) and
/// date-ascending within an offset. Offsets with no valid date contribute no
/// rows.
pub fn build_lead_rows(series: &[SmoothedPoint], max_offset: u32) -> Result<Vec<LeadRow>, LagError> {
    validate_series(series)?;

    let last = series[series.len() - 1].date;
    let deaths_by_date: HashMap<NaiveDate, Option<f64>> =
        series.iter().map(|p| (p.date, p.deaths_sdma)).collect();

    // Contiguous daily dates: no offset past `len - 1` can reach an observed date.
    let reachable = u32::try_from(series.len() - 1).unwrap_or(u32::MAX);
    let mut rows = Vec::new();
    for lead_offset in 0..=max_offset.min(reachable) {
        for p in series {
            let target = death_date(p.date, lead_offset);
            if target > last {
                break;
            }
            let Some(&led_deaths) = deaths_by_date.get(&target) else {
                continue;
            };
            rows.push(LeadRow {
                date: p.date,
                cases_sdma: p.cases_sdma,
                lead_offset,
                led_deaths,
            });
        }
    }

    Ok(rows)
}

/// Group lead rows by offset (ascending), keeping row order within a group.
pub fn group_by_offset(rows: &[LeadRow]) -> BTreeMap<u32, Vec<LeadRow>> {
    let mut groups: BTreeMap<u32, Vec<LeadRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.lead_offset).or_default().push(row.clone());
    }
    groups
}
