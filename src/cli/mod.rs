//! Command-line parsing for the case-to-death lead-time analysis.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{DEFAULT_MAX_OFFSET, SMOOTHING_WINDOW};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "covid-lag",
    version,
    about = "Estimate the lead time between reported cases and reported deaths"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the lead-offset sweep, pick the best offset and back-test it.
    Fit(FitArgs),
    /// Print the per-offset adjusted R² table only (useful for scripting).
    Sweep(FitArgs),
    /// Print the 7-day smoothed series (and a per-region overview).
    Smooth(FitArgs),
    /// Write a synthetic daily series to CSV.
    Sample(SampleArgs),
}

/// Common options for the analysis subcommands.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Daily CSV with region, date, cases and deaths columns.
    #[arg(long, value_name = "CSV", conflicts_with = "synthetic")]
    pub csv: Option<PathBuf>,

    /// Analyse a generated series instead of a CSV.
    #[arg(long)]
    pub synthetic: bool,

    /// Region to analyse (case-insensitive). Required when the input has several.
    #[arg(short = 'r', long)]
    pub region: Option<String>,

    /// Ignore rows before this date (YYYY-MM-DD).
    #[arg(long = "from", value_name = "DATE")]
    pub date_from: Option<NaiveDate>,

    /// Ignore rows after this date (YYYY-MM-DD).
    #[arg(long = "to", value_name = "DATE")]
    pub date_to: Option<NaiveDate>,

    /// Largest lead offset (days) to test.
    #[arg(short = 'k', long, default_value_t = DEFAULT_MAX_OFFSET)]
    pub max_offset: u32,

    /// Polynomial degree of the date trend term.
    #[arg(long, default_value_t = 1)]
    pub date_degree: usize,

    /// Moving-average window (days).
    #[arg(long, default_value_t = SMOOTHING_WINDOW)]
    pub window: usize,

    /// Comparison rows printed from each end of the table.
    #[arg(long, default_value_t = 5)]
    pub preview: usize,

    #[command(flatten)]
    pub synth: SynthArgs,

    /// Export per-offset fit quality to CSV.
    #[arg(long = "export-sweep", value_name = "CSV")]
    pub export_sweep: Option<PathBuf>,

    /// Export the selected model's coefficient table to CSV.
    #[arg(long = "export-coefficients", value_name = "CSV")]
    pub export_coefficients: Option<PathBuf>,

    /// Export the actual-vs-predicted table to CSV.
    #[arg(long = "export-comparison", value_name = "CSV")]
    pub export_comparison: Option<PathBuf>,

    /// Export a JSON run summary.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,

    /// Export the smoothed series to CSV.
    #[arg(long = "export-smoothed", value_name = "CSV")]
    pub export_smoothed: Option<PathBuf>,
}

/// Synthetic generator knobs.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Region name of the generated series.
    #[arg(long = "synthetic-region", default_value = "Synthetica")]
    pub synthetic_region: String,

    /// First generated date.
    #[arg(long, default_value = "2020-03-01")]
    pub start: NaiveDate,

    /// Number of generated days.
    #[arg(long, default_value_t = 180)]
    pub days: usize,

    /// True case-to-death delay (days).
    #[arg(long, default_value_t = 19)]
    pub lag: u32,

    /// Deaths per case.
    #[arg(long, default_value_t = 0.02)]
    pub ratio: f64,

    /// Relative Gaussian noise on daily counts (0 = noiseless).
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for writing a synthetic CSV.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,

    #[command(flatten)]
    pub synth: SynthArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_defaults_match_library_defaults() {
        let cli = Cli::parse_from(["covid-lag", "fit", "--synthetic"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert!(args.synthetic);
        assert_eq!(args.max_offset, 30);
        assert_eq!(args.date_degree, 1);
        assert_eq!(args.window, 7);
        assert_eq!(args.synth.lag, 19);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parses_csv_filters_and_verbosity() {
        let cli = Cli::parse_from([
            "covid-lag", "sweep", "--csv", "data.csv", "-r", "Canada", "--from", "2020-03-08", "-k", "21", "-vv",
        ]);
        let Command::Sweep(args) = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(args.csv, Some(PathBuf::from("data.csv")));
        assert_eq!(args.region.as_deref(), Some("Canada"));
        assert_eq!(args.date_from, NaiveDate::from_ymd_opt(2020, 3, 8));
        assert_eq!(args.max_offset, 21);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn csv_and_synthetic_conflict() {
        let res = Cli::try_parse_from(["covid-lag", "fit", "--csv", "a.csv", "--synthetic"]);
        assert!(res.is_err());
    }
}
