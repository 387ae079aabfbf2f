use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use covid_lag::data::smooth_region;
use covid_lag::domain::{FitResult, ModelSpec, SmoothedPoint, TimeSeriesPoint};
use covid_lag::fit::{build_lead_rows, fit_offset, select_best};

fn points(cases: &[f64], deaths: &[f64]) -> Vec<TimeSeriesPoint> {
    let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    cases
        .iter()
        .zip(deaths)
        .enumerate()
        .map(|(i, (&c, &d))| TimeSeriesPoint {
            region: "R".to_string(),
            date: start + Duration::days(i as i64),
            case_count: c,
            death_count: d,
        })
        .collect()
}

fn counts(len: std::ops::Range<usize>) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    len.prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..5000.0, n),
            prop::collection::vec(0.0f64..200.0, n),
        )
    })
}

fn smoothed(cases: &[f64], deaths: &[f64]) -> Vec<SmoothedPoint> {
    smooth_region(&points(cases, deaths), 7)
}

proptest! {
    #[test]
    fn smoothing_has_six_day_warm_up((cases, deaths) in counts(1..60)) {
        let out = smoothed(&cases, &deaths);
        let n = cases.len();
        prop_assert_eq!(out.len(), n);

        let defined = out.iter().filter(|p| p.cases_sdma.is_some()).count();
        prop_assert_eq!(defined, n.saturating_sub(6));
        prop_assert!(out.iter().take(6).all(|p| p.cases_sdma.is_none() && p.deaths_sdma.is_none()));

        for (i, p) in out.iter().enumerate().skip(6) {
            let mean = cases[i - 6..=i].iter().sum::<f64>() / 7.0;
            prop_assert!((p.cases_sdma.unwrap() - mean).abs() <= 1e-9 * (1.0 + mean.abs()));
        }
    }

    #[test]
    fn lead_row_exists_iff_death_date_is_observed(
        (cases, deaths) in counts(1..50),
        max_offset in 0u32..40,
    ) {
        let series = smoothed(&cases, &deaths);
        let n = series.len();
        let rows = build_lead_rows(&series, max_offset).unwrap();

        for k in 0..=max_offset {
            let at_k: Vec<_> = rows.iter().filter(|r| r.lead_offset == k).collect();
            prop_assert_eq!(at_k.len(), n.saturating_sub(k as usize));

            let usable = series.iter().filter(|p| p.deaths_sdma.is_some()).count();
            let complete = at_k.iter().filter(|r| r.is_complete()).count();
            prop_assert_eq!(complete, usable.saturating_sub(k as usize));
        }
    }

    #[test]
    fn fit_ignores_row_order(
        (cases, deaths) in counts(20..60),
        k in 0u32..8,
        seed in any::<u64>(),
    ) {
        let series = smoothed(&cases, &deaths);
        let rows: Vec<_> = build_lead_rows(&series, k)
            .unwrap()
            .into_iter()
            .filter(|r| r.lead_offset == k)
            .collect();

        let mut shuffled = rows.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let a = fit_offset(k, &rows, ModelSpec::default());
        let b = fit_offset(k, &shuffled, ModelSpec::default());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn selection_is_idempotent_and_prefers_lowest_offset(
        scores in prop::collection::vec(prop::sample::select(vec![0.1, 0.5, 0.9, 0.95]), 1..20),
    ) {
        let fits: Vec<FitResult> = scores
            .iter()
            .enumerate()
            .map(|(k, &adj)| fake_fit(k as u32, adj))
            .collect();

        let first = select_best(&fits, 30, 100).unwrap();
        let second = select_best(&fits, 30, 100).unwrap();
        prop_assert_eq!(&first, &second);

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = scores.iter().position(|&s| s == max).unwrap() as u32;
        prop_assert_eq!(first.lead_offset, lowest);

        let mut reversed = fits.clone();
        reversed.reverse();
        prop_assert_eq!(select_best(&reversed, 30, 100).unwrap().lead_offset, lowest);
    }
}

fn fake_fit(lead_offset: u32, adj: f64) -> FitResult {
    let d = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    FitResult {
        lead_offset,
        adjusted_r_squared: adj,
        model: covid_lag::domain::LinearFit {
            spec: ModelSpec::default(),
            date_origin: d,
            train_start: d,
            train_end: d,
            coefficients: Vec::new(),
            r_squared: adj,
            adjusted_r_squared: adj,
            sigma: 0.0,
            n_obs: 10,
            df_residual: 7,
        },
    }
}
