use chrono::NaiveDate;
use thiserror::Error;

/// Application-level error: a message plus the process exit code.
///
/// Exit codes:
/// - `2`: bad input or configuration
/// - `3`: not enough data to produce a result
/// - `4`: numerical or internal failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Conditions raised by the lead-time analysis core.
///
/// Not every variant is fatal: `InsufficientWindow`, `InsufficientDataForOffset`,
/// `DegenerateFit` and `DateRangeMismatch` are reported alongside a result
/// rather than returned in place of one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LagError {
    #[error("Region '{region}' has {observations} observation(s); the first {window} are needed before a moving average exists")]
    InsufficientWindow {
        region: String,
        observations: usize,
        window: usize,
    },

    #[error("Lead offset {lead_offset}: {rows} complete row(s), need at least {required} to fit")]
    InsufficientDataForOffset {
        lead_offset: u32,
        rows: usize,
        required: usize,
    },

    #[error("Lead offset {lead_offset}: degenerate fit ({reason})")]
    DegenerateFit { lead_offset: u32, reason: String },

    #[error(
        "No fittable model: every lead offset in 0..={max_offset} was skipped \
         ({usable_days} day(s) with smoothed values; the series is too short relative to the maximum offset)"
    )]
    NoFittableModel { max_offset: u32, usable_days: usize },

    #[error(
        "Prediction range {series_start}..{series_end} does not overlap the training range \
         {train_start}..{train_end}; comparison coverage is partial"
    )]
    DateRangeMismatch {
        series_start: NaiveDate,
        series_end: NaiveDate,
        train_start: NaiveDate,
        train_end: NaiveDate,
    },

    #[error("Series is empty")]
    EmptySeries,

    #[error("Series mixes regions '{first}' and '{other}'; filter to one region first")]
    MixedRegions { first: String, other: String },

    #[error("Dates are not strictly ascending: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("Daily dates are not contiguous: {previous} is followed by {next}")]
    MissingDays { previous: NaiveDate, next: NaiveDate },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LagError {
    /// Exit code used when the condition aborts the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            LagError::NoFittableModel { .. }
            | LagError::InsufficientDataForOffset { .. }
            | LagError::InsufficientWindow { .. }
            | LagError::EmptySeries => 3,
            LagError::DegenerateFit { .. } => 4,
            LagError::DateRangeMismatch { .. }
            | LagError::MixedRegions { .. }
            | LagError::UnorderedDates { .. }
            | LagError::MissingDays { .. }
            | LagError::InvalidConfig(_) => 2,
        }
    }
}

impl From<LagError> for AppError {
    fn from(err: LagError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
