//! CSV ingest and normalization.
//!
//! Turns a daily `(region, date, cases, deaths)` CSV into `TimeSeriesPoint`s.
//!
//! Design goals:
//! - **Flexible headers** (case-insensitive, common aliases, BOM tolerant)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no smoothing or fitting here

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use log::warn;

use crate::domain::TimeSeriesPoint;
use crate::error::AppError;

const REGION_COLUMNS: &[&str] = &["region", "location", "country", "country_region", "country/region"];
const DATE_COLUMNS: &[&str] = &["date"];
const CASE_COLUMNS: &[&str] = &["cases", "new_cases", "case_count"];
const DEATH_COLUMNS: &[&str] = &["deaths", "new_deaths", "death_count"];

/// Row filters applied during ingest.
#[derive(Debug, Clone, Default)]
pub struct IngestFilter {
    /// Keep only this region (case-insensitive).
    pub region: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl IngestFilter {
    /// Whether `point` passes the region and date filters.
    pub fn keeps(&self, point: &TimeSeriesPoint) -> bool {
        if let Some(region) = &self.region {
            if !point.region.eq_ignore_ascii_case(region) {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| point.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| point.date > to) {
            return false;
        }
        true
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized points + row errors + counters.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub points: Vec<TimeSeriesPoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Distinct regions among the kept rows, sorted.
    pub regions: Vec<String>,
    /// Kept rows with a negative case or death count (upstream corrections).
    pub negative_rows: usize,
}

impl IngestedSeries {
    /// Wrap already-loaded points (e.g. synthetic data) with trivial ingest stats.
    pub fn from_points(points: Vec<TimeSeriesPoint>) -> Self {
        let regions = distinct_regions(&points);
        let n = points.len();
        Self {
            points,
            row_errors: Vec::new(),
            rows_read: n,
            rows_used: n,
            regions,
            negative_rows: 0,
        }
    }
}

/// Load a CSV file from disk.
pub fn load_csv(path: &Path, filter: &IngestFilter) -> Result<IngestedSeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    load_from_reader(file, filter)
}

/// Load a CSV from any reader.
pub fn load_from_reader<R: Read>(reader: R, filter: &IngestFilter) -> Result<IngestedSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let columns = Columns {
        region: find_column(&header_map, REGION_COLUMNS)?,
        date: find_column(&header_map, DATE_COLUMNS)?,
        cases: find_column(&header_map, CASE_COLUMNS)?,
        deaths: find_column(&header_map, DEATH_COLUMNS)?,
    };

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut negative_rows = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(point) => {
                if !filter.keeps(&point) {
                    continue;
                }
                if point.case_count < 0.0 || point.death_count < 0.0 {
                    negative_rows += 1;
                }
                points.push(point);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(
            "{} of {rows_read} CSV row(s) could not be parsed (first: line {}: {})",
            row_errors.len(),
            row_errors[0].line,
            row_errors[0].message
        );
    }
    if negative_rows > 0 {
        warn!("{negative_rows} row(s) carry negative daily counts; kept as reported");
    }

    let rows_used = points.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows remain after parsing/filtering."));
    }

    let regions = distinct_regions(&points);
    Ok(IngestedSeries {
        points,
        row_errors,
        rows_read,
        rows_used,
        regions,
        negative_rows,
    })
}

struct Columns {
    region: usize,
    date: usize,
    cases: usize,
    deaths: usize,
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Result<usize, AppError> {
    aliases
        .iter()
        .find_map(|alias| header_map.get(*alias).copied())
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("Missing required column: one of `{}`", aliases.join("`, `")),
            )
        })
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<TimeSeriesPoint, String> {
    let region = get_required(record, columns.region, "region")?.to_string();
    let date = parse_date(get_required(record, columns.date, "date")?)?;
    let case_count = parse_count(get_required(record, columns.cases, "cases")?, "cases")?;
    let death_count = parse_count(get_required(record, columns.deaths, "deaths")?, "deaths")?;

    Ok(TimeSeriesPoint {
        region,
        date,
        case_count,
        death_count,
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("Missing `{name}` value.")),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|_| format!("Invalid date `{s}` (expected YYYY-MM-DD)."))
}

fn parse_count(s: &str, name: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("Invalid `{name}` value `{s}`."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

fn distinct_regions(points: &[TimeSeriesPoint]) -> Vec<String> {
    points
        .iter()
        .map(|p| p.region.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
