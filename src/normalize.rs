//! Schema normalization: untrusted spreadsheet columns in, canonical typed
//! columns out.
//!
//! Every column is read as a string first. Header whitespace is trimmed,
//! variant headers are renamed to their canonical names, and the known date
//! and numeric columns are coerced cell by cell. A cell that fails to parse
//! becomes null; only an unreadable file fails the run.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::debug;

use crate::error::TrackError;
use crate::schema::{aliases, equipment};

/// Datetime cell formats, tried in order.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Date-only cell formats, tried after the datetime forms. Midnight is used
/// for the missing time component.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame, TrackError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// Normalize a raw all-string DataFrame into the canonical record shape.
///
/// Columns absent from the input stay absent; downstream components check
/// presence before use.
pub fn normalize(raw: DataFrame) -> Result<DataFrame, TrackError> {
    let mut df = resolve_aliases(raw)?;
    df = trim_categorical_cells(df)?;
    for column in equipment::DATE_COLUMNS {
        df = parse_date_column(df, column)?;
    }
    for column in equipment::NUMERIC_COLUMNS {
        df = parse_numeric_column(df, column)?;
    }
    debug!(rows = df.height(), columns = df.width(), "normalized dataset");
    Ok(df)
}

/// Rename variant headers to canonical names per the alias table.
/// An alias is skipped when its canonical target already exists; the first
/// matching alias per target wins.
fn resolve_aliases(raw: DataFrame) -> Result<DataFrame, TrackError> {
    let mut old: Vec<&str> = Vec::new();
    let mut new: Vec<&str> = Vec::new();

    let schema = raw.schema();
    for (variant, canonical) in aliases::TABLE {
        if schema.contains(variant) && !schema.contains(canonical) && !new.contains(&canonical) {
            old.push(variant);
            new.push(canonical);
        }
    }

    if old.is_empty() {
        return Ok(raw);
    }
    debug!(renamed = old.len(), "resolved variant column names");
    Ok(raw.lazy().rename(old, new, true).collect()?)
}

/// Strip surrounding whitespace from the cells of known categorical columns,
/// so filter equality and billing-basis matching see clean values.
fn trim_categorical_cells(df: DataFrame) -> Result<DataFrame, TrackError> {
    let mut exprs = Vec::new();
    for column in equipment::CATEGORICAL_COLUMNS {
        if df.column(column).is_ok() {
            exprs.push(col(column).str().strip_chars(lit(" \t\r\n")));
        }
    }
    if exprs.is_empty() {
        return Ok(df);
    }
    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// Replace a string column with its datetime parse. Unparsable cells become
/// null. Absent columns are left alone.
fn parse_date_column(mut df: DataFrame, column: &str) -> Result<DataFrame, TrackError> {
    if df.column(column).is_err() {
        return Ok(df);
    }

    let strings = df.column(column)?.str()?;
    let mut parsed: Vec<Option<i64>> = Vec::with_capacity(strings.len());
    for value in strings.into_iter() {
        parsed.push(
            value
                .and_then(parse_date_cell)
                .map(|dt| dt.and_utc().timestamp_micros()),
        );
    }

    let series = Series::new(column.into(), &parsed)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    df.with_column(series)?;
    Ok(df)
}

/// Replace a string column with its float parse. Non-numeric cells become
/// null. Absent columns are left alone.
fn parse_numeric_column(mut df: DataFrame, column: &str) -> Result<DataFrame, TrackError> {
    if df.column(column).is_err() {
        return Ok(df);
    }

    let strings = df.column(column)?.str()?;
    let mut parsed: Vec<Option<f64>> = Vec::with_capacity(strings.len());
    for value in strings.into_iter() {
        parsed.push(value.and_then(parse_numeric_cell));
    }

    let series = Series::new(column.into(), &parsed);
    df.with_column(series)?;
    Ok(df)
}

/// Parse one date cell, trying each accepted format in order.
pub(crate) fn parse_date_cell(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse one numeric cell. Tolerates surrounding whitespace and thousands
/// separators ("1,250.00"). Non-finite literals ("NaN", "inf") count as
/// missing values, and anything else non-numeric yields None, so a parsed
/// column never carries a NaN into downstream sums.
pub(crate) fn parse_numeric_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::derived;

    fn string_column(name: &str, values: &[Option<&str>]) -> Column {
        Column::new(name.into(), values)
    }

    #[test]
    fn date_cell_accepts_every_format() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date_cell("2024-03-05"), Some(expected));
        assert_eq!(parse_date_cell("2024/03/05"), Some(expected));
        assert_eq!(parse_date_cell("03/05/2024"), Some(expected));
        assert_eq!(parse_date_cell(" 2024-03-05 "), Some(expected));

        let with_time = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_date_cell("2024-03-05 14:30:00"), Some(with_time));
        assert_eq!(parse_date_cell("2024-03-05T14:30:00"), Some(with_time));
    }

    #[test]
    fn date_cell_rejects_garbage() {
        assert_eq!(parse_date_cell(""), None);
        assert_eq!(parse_date_cell("   "), None);
        assert_eq!(parse_date_cell("soon"), None);
        assert_eq!(parse_date_cell("2024-13-45"), None);
    }

    #[test]
    fn numeric_cell_tolerates_separators() {
        assert_eq!(parse_numeric_cell("1250"), Some(1250.0));
        assert_eq!(parse_numeric_cell(" 1,250.75 "), Some(1250.75));
        assert_eq!(parse_numeric_cell("-3.5"), Some(-3.5));
        assert_eq!(parse_numeric_cell(""), None);
        assert_eq!(parse_numeric_cell("TBD"), None);
        assert_eq!(parse_numeric_cell("$100"), None);
    }

    #[test]
    fn numeric_cell_rejects_non_finite_literals() {
        assert_eq!(parse_numeric_cell("NaN"), None);
        assert_eq!(parse_numeric_cell("nan"), None);
        assert_eq!(parse_numeric_cell("inf"), None);
        assert_eq!(parse_numeric_cell("-Infinity"), None);
        assert_eq!(parse_numeric_cell("1e3"), Some(1000.0));
    }

    #[test]
    fn variant_headers_resolve_to_canonical() {
        let raw = DataFrame::new(vec![
            string_column("Supplier", &[Some("Acme Rentals")]),
            string_column("Status", &[Some("Active")]),
            string_column("Rate", &[Some("100")]),
        ])
        .unwrap();

        let df = normalize(raw).unwrap();
        assert!(df.column(equipment::VENDOR).is_ok());
        assert!(df.column(equipment::CURRENT_STATUS).is_ok());
        assert!(df.column(equipment::UNIT_RATE).is_ok());
        assert!(df.column("Supplier").is_err());
    }

    #[test]
    fn alias_skipped_when_canonical_present() {
        let raw = DataFrame::new(vec![
            string_column(equipment::VENDOR, &[Some("Canonical Co")]),
            string_column("Supplier", &[Some("Variant Co")]),
        ])
        .unwrap();

        let df = normalize(raw).unwrap();
        let vendors = df.column(equipment::VENDOR).unwrap().str().unwrap();
        assert_eq!(vendors.get(0), Some("Canonical Co"));
        // The variant column survives untouched under its own name.
        assert!(df.column("Supplier").is_ok());
    }

    #[test]
    fn date_column_coerces_and_nulls_bad_cells() {
        let raw = DataFrame::new(vec![string_column(
            equipment::MOBILIZATION_DATE,
            &[Some("2024-01-15"), Some("not a date"), None],
        )])
        .unwrap();

        let df = normalize(raw).unwrap();
        let column = df.column(equipment::MOBILIZATION_DATE).unwrap();
        assert_eq!(
            column.dtype(),
            &DataType::Datetime(TimeUnit::Microseconds, None)
        );
        assert_eq!(column.null_count(), 2);
    }

    #[test]
    fn numeric_column_coerces_and_nulls_bad_cells() {
        let raw = DataFrame::new(vec![string_column(
            equipment::UNIT_RATE,
            &[Some("100"), Some("1,500.50"), Some("call us"), None],
        )])
        .unwrap();

        let df = normalize(raw).unwrap();
        let rates = df.column(equipment::UNIT_RATE).unwrap().f64().unwrap();
        assert_eq!(rates.get(0), Some(100.0));
        assert_eq!(rates.get(1), Some(1500.5));
        assert_eq!(rates.get(2), None);
        assert_eq!(rates.get(3), None);
    }

    #[test]
    fn categorical_cells_are_trimmed() {
        let raw = DataFrame::new(vec![string_column(
            equipment::BILLING_BASIS,
            &[Some(" Daily "), Some("Weekly")],
        )])
        .unwrap();

        let df = normalize(raw).unwrap();
        let bases = df.column(equipment::BILLING_BASIS).unwrap().str().unwrap();
        assert_eq!(bases.get(0), Some("Daily"));
        assert_eq!(bases.get(1), Some("Weekly"));
    }

    #[test]
    fn absent_columns_stay_absent() {
        let raw = DataFrame::new(vec![string_column(
            equipment::EQUIPMENT_DESCRIPTION,
            &[Some("Tower Crane")],
        )])
        .unwrap();

        let df = normalize(raw).unwrap();
        assert!(df.column(equipment::MOBILIZATION_DATE).is_err());
        assert!(df.column(derived::DAYS_ONSITE).is_err());
        assert_eq!(df.width(), 1);
    }
}
