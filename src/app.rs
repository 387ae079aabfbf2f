//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initializes logging
//! - loads a CSV or generates a synthetic series
//! - runs the lead-time search + back-test
//! - prints reports
//! - writes optional exports

use clap::Parser;
use log::{info, LevelFilter};

use crate::cli::{Command, FitArgs, SampleArgs, SynthArgs};
use crate::domain::{AnalysisConfig, InputSource, ModelSpec, OutputMode, SyntheticConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `covid-lag` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args, OutputMode::Full),
        Command::Sweep(args) => handle_fit(args, OutputMode::Sweep),
        Command::Smooth(args) => handle_smooth(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // `RUST_LOG` (parsed after the default) wins when set.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

fn handle_fit(args: FitArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    match mode {
        OutputMode::Full => {
            println!("{}", crate::report::format_run_summary(&run, &config));
            println!("{}", crate::report::format_sweep_table(&run.sweep, run.best.lead_offset));
            println!("{}", crate::report::format_coefficients(&run.best));
            println!(
                "{}",
                crate::report::format_comparison_preview(&run.backtest, config.preview_rows)
            );
        }
        OutputMode::Sweep => {
            println!("{}", crate::report::format_sweep_table(&run.sweep, run.best.lead_offset));
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_sweep {
        crate::io::export::write_sweep_csv(path, &run.sweep.summary())?;
    }
    if let Some(path) = &config.export_coefficients {
        crate::io::export::write_coefficients_csv(path, &run.best.model.coefficients)?;
    }
    if let Some(path) = &config.export_comparison {
        crate::io::export::write_comparison_csv(path, &run.backtest.rows)?;
    }
    if let Some(path) = &config.export_summary {
        crate::io::summary::write_summary_json(path, &run, &config)?;
    }
    if let Some(path) = &config.export_smoothed {
        crate::io::export::write_smoothed_csv(path, &run.series)?;
    }

    Ok(())
}

fn handle_smooth(args: FitArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    config.validate()?;
    let ingest = pipeline::load_input(&config)?;
    let (regions, _notes) = crate::data::smooth_all(&ingest.points, config.window);

    println!("{}", crate::report::format_region_overview(&regions));

    // Detailed series only when the target region is unambiguous.
    if config.region.is_none() && regions.len() > 1 {
        info!("{} regions in input; pass --region for a detailed series", regions.len());
        return Ok(());
    }
    let prepared = pipeline::prepare_from_ingest(&config, ingest)?;
    println!("{}", crate::report::format_smoothed(&prepared.region, &prepared.series));

    if let Some(path) = &config.export_smoothed {
        crate::io::export::write_smoothed_csv(path, &prepared.series)?;
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let synthetic = synthetic_config_from_args(&args.synth);
    let points = crate::data::generate_series(&synthetic)?;
    crate::io::export::write_series_csv(&args.output, &points)?;
    println!(
        "Wrote {} day(s) for '{}' to {}",
        points.len(),
        synthetic.region,
        args.output.display()
    );
    Ok(())
}

/// Build the pipeline configuration from parsed flags.
pub fn analysis_config_from_args(args: &FitArgs) -> Result<AnalysisConfig, AppError> {
    let source = match (&args.csv, args.synthetic) {
        (Some(path), false) => InputSource::Csv(path.clone()),
        (None, true) => InputSource::Synthetic(synthetic_config_from_args(&args.synth)),
        _ => return Err(AppError::new(2, "Provide exactly one input: `--csv <CSV>` or `--synthetic`.")),
    };

    Ok(AnalysisConfig {
        source,
        region: args.region.clone(),
        date_from: args.date_from,
        date_to: args.date_to,
        max_offset: args.max_offset,
        model: ModelSpec {
            date_degree: args.date_degree,
        },
        window: args.window,
        preview_rows: args.preview,
        export_sweep: args.export_sweep.clone(),
        export_coefficients: args.export_coefficients.clone(),
        export_comparison: args.export_comparison.clone(),
        export_summary: args.export_summary.clone(),
        export_smoothed: args.export_smoothed.clone(),
    })
}

pub fn synthetic_config_from_args(args: &SynthArgs) -> SyntheticConfig {
    SyntheticConfig {
        region: args.synthetic_region.clone(),
        start: args.start,
        days: args.days,
        lag: args.lag,
        fatality_ratio: args.ratio,
        noise: args.noise,
        seed: args.seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn fit_args(argv: &[&str]) -> FitArgs {
        let cli = Cli::parse_from(argv.iter().copied());
        match cli.command {
            Command::Fit(args) | Command::Sweep(args) | Command::Smooth(args) => args,
            Command::Sample(_) => panic!("expected an analysis subcommand"),
        }
    }

    #[test]
    fn config_mirrors_flags() {
        let args = fit_args(&["covid-lag", "fit", "--synthetic", "--lag", "11", "--date-degree", "2", "-k", "20"]);
        let config = analysis_config_from_args(&args).unwrap();
        assert_eq!(config.max_offset, 20);
        assert_eq!(config.model.date_degree, 2);
        match config.source {
            InputSource::Synthetic(s) => assert_eq!(s.lag, 11),
            InputSource::Csv(_) => panic!("expected synthetic input"),
        }
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        let args = fit_args(&["covid-lag", "fit"]);
        let err = analysis_config_from_args(&args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn default_flags_match_default_config() {
        let args = fit_args(&["covid-lag", "fit", "--synthetic"]);
        let config = analysis_config_from_args(&args).unwrap();
        let defaults = AnalysisConfig::default();
        assert_eq!(config.source, defaults.source);
        assert_eq!(config.max_offset, defaults.max_offset);
        assert_eq!(config.model, defaults.model);
        assert_eq!(config.window, defaults.window);
        assert_eq!(config.preview_rows, defaults.preview_rows);
    }
}
