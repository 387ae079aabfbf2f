//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, BestFit, InputSource, SmoothedPoint};
use crate::fit::{BacktestOutput, SweepOutput};

/// Format the run summary (input stats + chosen offset).
pub fn format_run_summary(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();

    out.push_str("=== covid-lag - case-to-death lead time ===\n");
    let source = match &config.source {
        InputSource::Csv(path) => format!("{}", path.display()),
        InputSource::Synthetic(s) => format!("synthetic (lag={}d, ratio={}, noise={})", s.lag, s.fatality_ratio, s.noise),
    };
    out.push_str(&format!("Input: {source}\n"));
    out.push_str(&format!(
        "Rows: read={} used={} errors={} | regions={}\n",
        run.ingest.rows_read,
        run.ingest.rows_used,
        run.ingest.row_errors.len(),
        run.ingest.regions.len()
    ));
    out.push_str(&format!(
        "Region: {} | {}..{} ({} day(s))\n",
        run.region,
        run.first_date,
        run.last_date,
        run.series.len()
    ));
    out.push_str(&format!(
        "Model: led_deaths ~ {} | offsets 0..={}\n",
        config.model.term_names()[1..].join(" + "),
        config.max_offset
    ));

    out.push_str("\nChosen lead offset:\n");
    out.push_str(&format!(
        "- {} day(s) | adj R²={:.4} | R²={:.4} | n={}\n",
        run.best.lead_offset, run.best.adjusted_r_squared, run.best.model.r_squared, run.best.model.n_obs
    ));
    if let Some(rmse) = run.backtest.rmse() {
        out.push_str(&format!("- back-test RMSE: {rmse:.3} deaths/day\n"));
    }

    let warnings = run.notes.iter().chain(run.backtest.warning.iter());
    for w in warnings {
        out.push_str(&format!("! {w}\n"));
    }

    out
}

/// Per-offset adjusted R², chosen row marked `*`, skipped offsets listed below.
pub fn format_sweep_table(sweep: &SweepOutput, chosen: u32) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<2}{:>6} {:>10} {:>6}\n", "", "offset", "adj_r2", "n"));
    out.push_str(&format!("{:<2}{:-<6} {:-<10} {:-<6}\n", "", "", "", ""));
    for fit in &sweep.fits {
        let mark = if fit.lead_offset == chosen { "*" } else { " " };
        out.push_str(&format!(
            "{mark} {:>6} {:>10.4} {:>6}\n",
            fit.lead_offset, fit.adjusted_r_squared, fit.model.n_obs
        ));
    }
    for s in &sweep.skipped {
        out.push_str(&format!("  (skipped {}) {}\n", s.lead_offset, s.reason));
    }
    out
}

/// Coefficient table of the selected model.
pub fn format_coefficients(best: &BestFit) -> String {
    let mut out = String::new();
    out.push_str(&format!("Coefficients (lead offset {}):\n", best.lead_offset));
    out.push_str(&format!(
        "{:<12} {:>14} {:>12} {:>10} {:>10}\n",
        "term", "estimate", "std_error", "t", "p"
    ));
    for c in &best.model.coefficients {
        out.push_str(&format!(
            "{:<12} {:>14.6} {:>12.6} {:>10.3} {:>10}\n",
            c.term,
            c.estimate,
            c.std_error,
            c.statistic,
            fmt_p(c.p_value)
        ));
    }
    out.push_str(&format!(
        "sigma={:.4} on {} df\n",
        best.model.sigma, best.model.df_residual
    ));
    out
}

/// First and last `rows` lines of the comparison table.
pub fn format_comparison_preview(backtest: &BacktestOutput, rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Actual vs predicted deaths (predictions dated case date + {}):\n",
        backtest.lead_offset
    ));
    out.push_str(&format!("{:<10} {:>12} {:>12}\n", "date", "actual", "predicted"));

    let n = backtest.rows.len();
    let line = |r: &crate::domain::ComparisonRow| {
        format!(
            "{:<10} {:>12} {:>12}\n",
            r.date,
            fmt_opt(r.actual_deaths_sdma),
            fmt_opt(r.predicted_deaths)
        )
    };
    if n <= rows.saturating_mul(2) {
        for r in &backtest.rows {
            out.push_str(&line(r));
        }
    } else {
        for r in &backtest.rows[..rows] {
            out.push_str(&line(r));
        }
        out.push_str(&format!("... {} row(s) ...\n", n - rows.saturating_mul(2)));
        for r in &backtest.rows[n - rows..] {
            out.push_str(&line(r));
        }
    }
    out
}

/// Latest smoothed cases/deaths and their ratio for every region.
pub fn format_region_overview(regions: &[(String, Vec<SmoothedPoint>)]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:>10} {:>12} {:>12} {:>8}\n",
        "region", "as_of", "cases_sdma", "deaths_sdma", "ratio"
    ));
    for (region, series) in regions {
        let latest = series
            .iter()
            .rev()
            .find(|p| p.cases_sdma.is_some() || p.deaths_sdma.is_some());
        match latest {
            Some(p) => {
                let ratio = match (p.cases_sdma, p.deaths_sdma) {
                    (Some(c), Some(d)) if c != 0.0 => format!("{:.4}", d / c),
                    _ => "-".to_string(),
                };
                out.push_str(&format!(
                    "{:<24} {:>10} {:>12} {:>12} {:>8}\n",
                    truncate(region, 24),
                    p.date,
                    fmt_opt(p.cases_sdma),
                    fmt_opt(p.deaths_sdma),
                    ratio
                ));
            }
            None => out.push_str(&format!(
                "{:<24} {:>10} {:>12} {:>12} {:>8}\n",
                truncate(region, 24),
                "-",
                "-",
                "-",
                "-"
            )),
        }
    }
    out
}

/// Full smoothed series for one region.
pub fn format_smoothed(region: &str, series: &[SmoothedPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Smoothed series: {region}\n"));
    out.push_str(&format!("{:<10} {:>12} {:>12}\n", "date", "cases_sdma", "deaths_sdma"));
    for p in series {
        out.push_str(&format!(
            "{:<10} {:>12} {:>12}\n",
            p.date,
            fmt_opt(p.cases_sdma),
            fmt_opt(p.deaths_sdma)
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.3}")).unwrap_or_else(|| "NA".to_string())
}

fn fmt_p(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p < 1e-4 {
        "<1e-4".to_string()
    } else {
        format!("{p:.4}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use crate::domain::ComparisonRow;

    fn day(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + Duration::days(i)
    }

    #[test]
    fn preview_elides_the_middle() {
        let rows = (0..20)
            .map(|i| ComparisonRow {
                date: day(i),
                actual_deaths_sdma: Some(i as f64),
                predicted_deaths: None,
            })
            .collect();
        let backtest = BacktestOutput {
            lead_offset: 3,
            rows,
            warning: None,
        };
        let text = format_comparison_preview(&backtest, 2);
        assert!(text.contains("... 16 row(s) ..."));
        assert!(text.contains("2020-03-01"));
        assert!(text.contains("2020-03-20"));
        assert!(!text.contains("2020-03-10"));
        assert!(text.contains("NA"));
    }

    #[test]
    fn overview_reports_latest_ratio() {
        let series = vec![
            SmoothedPoint {
                region: "Canada".to_string(),
                date: day(0),
                cases_sdma: Some(100.0),
                deaths_sdma: Some(1.0),
            },
            SmoothedPoint {
                region: "Canada".to_string(),
                date: day(1),
                cases_sdma: Some(200.0),
                deaths_sdma: Some(5.0),
            },
        ];
        let short = vec![SmoothedPoint {
            region: "Tiny".to_string(),
            date: day(0),
            cases_sdma: None,
            deaths_sdma: None,
        }];
        let text = format_region_overview(&[("Canada".to_string(), series), ("Tiny".to_string(), short)]);
        assert!(text.contains("2020-03-02"));
        assert!(text.contains("0.0250"));
        assert!(text.lines().any(|l| l.starts_with("Tiny") && l.contains('-')));
    }

    #[test]
    fn huge_preview_prints_every_row() {
        let rows = (0..3)
            .map(|i| ComparisonRow {
                date: day(i),
                actual_deaths_sdma: Some(1.0),
                predicted_deaths: Some(1.5),
            })
            .collect();
        let backtest = BacktestOutput {
            lead_offset: 0,
            rows,
            warning: None,
        };
        let text = format_comparison_preview(&backtest, usize::MAX);
        assert!(!text.contains("row(s) ..."));
        assert_eq!(text.lines().filter(|l| l.starts_with("2020-")).count(), 3);
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("Canada", 10), "Canada");
        assert_eq!(truncate("Bosnia and Herzegovina", 8), "Bosnia .");
    }
}
