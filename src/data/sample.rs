//! Deterministic synthetic case/death series.
//!
//! Cases follow two overlapping epidemic waves; deaths are a fixed fraction of
//! the cases reported `lag` days earlier. With `noise = 0` the relation is
//! exact, which makes the generator a ground truth for the lead-time search.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::Duration;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{SyntheticConfig, TimeSeriesPoint};
use crate::error::AppError;

/// Baseline daily cases between waves.
const CASE_FLOOR: f64 = 200.0;

/// `(peak day, height, width in days)` of each wave.
const WAVES: [(f64, f64, f64); 2] = [(60.0, 1800.0, 25.0), (140.0, 1200.0, 30.0)];

/// Noise-free expected daily cases on day `t` (day 0 is the first date).
pub fn wave_cases(t: f64) -> f64 {
    let mut y = CASE_FLOOR;
    for (peak, height, width) in WAVES {
        let z = (t - peak) / width;
        y += height * (-z * z).exp();
    }
    y
}

/// Generate the synthetic series described by `config`.
pub fn generate_series(config: &SyntheticConfig) -> Result<Vec<TimeSeriesPoint>, AppError> {
    if config.days == 0 {
        return Err(AppError::new(2, "Synthetic series needs at least one day."));
    }
    if !(config.fatality_ratio.is_finite() && config.fatality_ratio >= 0.0) {
        return Err(AppError::new(2, "Fatality ratio must be finite and >= 0."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    // Cases start `lag` days before the first reported date so every reported
    // death has the case count it derives from.
    let lag = config.lag as usize;
    let mut history = Vec::with_capacity(config.days + lag);
    for i in 0..config.days + lag {
        let t = i as f64 - lag as f64;
        let level = wave_cases(t);
        let value = if config.noise > 0.0 {
            level * (1.0 + config.noise * normal.sample(&mut rng))
        } else {
            level
        };
        history.push(value.max(0.0));
    }

    let mut points = Vec::with_capacity(config.days);
    for day in 0..config.days {
        let cases = history[day + lag];
        let mut deaths = config.fatality_ratio * history[day];
        if config.noise > 0.0 {
            deaths *= 1.0 + config.noise * normal.sample(&mut rng);
        }

        let date = config
            .start
            .checked_add_signed(Duration::days(day as i64))
            .ok_or_else(|| AppError::new(2, "Synthetic date range overflows the calendar."))?;

        points.push(TimeSeriesPoint {
            region: config.region.clone(),
            date,
            case_count: cases,
            death_count: deaths.max(0.0),
        });
    }

    Ok(points)
}

fn sample_seed(config: &SyntheticConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.region.hash(&mut hasher);
    config.start.hash(&mut hasher);
    config.days.hash(&mut hasher);
    config.lag.hash(&mut hasher);
    config.fatality_ratio.to_bits().hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    hasher.finish()
}
