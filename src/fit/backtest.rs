//! Back-test: apply the selected model to the full history.
//!
//! A prediction made from the case average observed on `d` is a prediction of
//! the death average on `death_date(d, lead_offset)`. Predictions are
//! re-dated with that formula and full-outer-joined with the observed death
//! averages, so both series keep their non-overlapping edges.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::warn;

use crate::domain::{BestFit, ComparisonRow, SmoothedPoint};
use crate::error::LagError;
use crate::fit::lead::death_date;

/// Comparison table plus any coverage warning.
#[derive(Debug, Clone)]
pub struct BacktestOutput {
    pub lead_offset: u32,
    /// Date-ascending union of actual and predicted dates.
    pub rows: Vec<ComparisonRow>,
    /// `DateRangeMismatch` when the case dates used for prediction do not
    /// overlap the model's training dates.
    pub warning: Option<LagError>,
}

impl BacktestOutput {
    /// Rows that carry both an actual and a predicted value.
    pub fn overlapping(&self) -> impl Iterator<Item = (NaiveDate, f64, f64)> + '_ {
        self.rows.iter().filter_map(|r| match (r.actual_deaths_sdma, r.predicted_deaths) {
            (Some(a), Some(p)) => Some((r.date, a, p)),
            _ => None,
        })
    }

    /// Root-mean-square error over overlapping rows, if any.
    pub fn rmse(&self) -> Option<f64> {
        let (n, sse) = self
            .overlapping()
            .fold((0usize, 0.0), |(n, sse), (_, a, p)| (n + 1, sse + (a - p) * (a - p)));
        (n > 0).then(|| (sse / n as f64).sqrt())
    }
}

/// Predict deaths for every date of `series` and align them against the actuals.
///
/// `series` is the region's full smoothed series (not lead-shifted). Dates
/// without a case average produce no prediction; dates without a death
/// average keep `actual_deaths_sdma = None`.
pub fn backtest(best: &BestFit, series: &[SmoothedPoint]) -> BacktestOutput {
    let mut joined: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for p in series {
        joined.entry(p.date).or_default().0 = p.deaths_sdma;
    }

    let mut case_dates: Option<(NaiveDate, NaiveDate)> = None;
    for p in series {
        let Some(cases) = p.cases_sdma else {
            continue;
        };
        let predicted = best.model.predict(cases, p.date);
        if !predicted.is_finite() {
            continue;
        }
        joined
            .entry(death_date(p.date, best.lead_offset))
            .or_default()
            .1 = Some(predicted);
        case_dates = Some(match case_dates {
            Some((lo, hi)) => (lo.min(p.date), hi.max(p.date)),
            None => (p.date, p.date),
        });
    }

    let warning = case_dates.and_then(|(start, end)| {
        let (train_start, train_end) = (best.model.train_start, best.model.train_end);
        let overlaps = start <= train_end && train_start <= end;
        (!overlaps).then_some(LagError::DateRangeMismatch {
            series_start: start,
            series_end: end,
            train_start,
            train_end,
        })
    });
    if let Some(w) = &warning {
        warn!("{w}");
    }

    let rows = joined
        .into_iter()
        .map(|(date, (actual_deaths_sdma, predicted_deaths))| ComparisonRow {
            date,
            actual_deaths_sdma,
            predicted_deaths,
        })
        .collect();

    BacktestOutput {
        lead_offset: best.lead_offset,
        rows,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoefficientRow, LinearFit, ModelSpec};
    use chrono::Duration;

    fn coefficient(term: &str, estimate: f64) -> CoefficientRow {
        CoefficientRow {
            term: term.to_string(),
            estimate,
            std_error: 0.0,
            statistic: f64::INFINITY,
            p_value: 0.0,
        }
    }

    /// deaths = 0.1 · cases, no date trend.
    fn best_fit(lead_offset: u32, train_start: NaiveDate, train_end: NaiveDate) -> BestFit {
        BestFit {
            lead_offset,
            adjusted_r_squared: 1.0,
            model: LinearFit {
                spec: ModelSpec::default(),
                date_origin: train_start,
                train_start,
                train_end,
                coefficients: vec![
                    coefficient("(Intercept)", 0.0),
                    coefficient("cases_sdma", 0.1),
                    coefficient("date", 0.0),
                ],
                r_squared: 1.0,
                adjusted_r_squared: 1.0,
                sigma: 0.0,
                n_obs: 10,
                df_residual: 7,
            },
        }
    }

    fn series(start: NaiveDate, n: usize) -> Vec<SmoothedPoint> {
        (0..n)
            .map(|i| SmoothedPoint {
                region: "R".to_string(),
                date: start + Duration::days(i as i64),
                cases_sdma: (i >= 2).then_some(10.0 * i as f64),
                deaths_sdma: (i >= 2).then_some(i as f64),
            })
            .collect()
    }

    #[test]
    fn predictions_land_on_case_date_plus_offset() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let s = series(start, 10);
        let out = backtest(&best_fit(3, start, start + Duration::days(6)), &s);

        // Cases on day 4 (40.0) predict 4.0 deaths on day 7.
        let day7 = out.rows.iter().find(|r| r.date == start + Duration::days(7)).unwrap();
        assert_eq!(day7.predicted_deaths, Some(4.0));
        assert_eq!(day7.actual_deaths_sdma, Some(7.0));
    }

    #[test]
    fn full_outer_join_keeps_both_edges() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let s = series(start, 10);
        let out = backtest(&best_fit(3, start, start + Duration::days(6)), &s);

        // Actual dates: days 0..=9. Predicted dates: days 5..=12.
        assert_eq!(out.rows.len(), 13);
        assert_eq!(out.rows.first().unwrap().date, start);
        assert_eq!(out.rows.last().unwrap().date, start + Duration::days(12));

        let only_actual = out.rows.iter().filter(|r| r.predicted_deaths.is_none()).count();
        let only_predicted = out.rows.iter().filter(|r| r.actual_deaths_sdma.is_none() && r.predicted_deaths.is_some()).count();
        assert_eq!(only_actual, 5); // days 0..=4
        assert_eq!(only_predicted, 3); // days 10..=12
        assert_eq!(out.overlapping().count(), 5);
        assert!(out.warning.is_none());
        assert!(out.rows.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn zero_offset_predicts_same_day() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let out = backtest(&best_fit(0, start, start + Duration::days(9)), &series(start, 10));
        assert_eq!(out.rows.len(), 10);
        assert_eq!(out.rmse(), Some(0.0));
    }

    #[test]
    fn disjoint_training_range_is_reported() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let train_start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let best = best_fit(2, train_start, train_start + Duration::days(30));
        let out = backtest(&best, &series(start, 10));

        assert!(matches!(out.warning, Some(LagError::DateRangeMismatch { .. })));
        // The join still runs.
        assert_eq!(out.rows.len(), 12);
    }
}
