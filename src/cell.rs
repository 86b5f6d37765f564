//! Row-level cell access shared by the computation modules.

use polars::datatypes::AnyValue;
use polars::prelude::*;

/// Microsecond timestamp of a datetime cell, or None for null/non-datetime.
pub(crate) fn datetime_us(series: &Series, row: usize) -> Option<i64> {
    match series.get(row) {
        Ok(AnyValue::Datetime(us, _, _)) => Some(us),
        _ => None,
    }
}

/// Cell rendered as display text. Null cells yield None so a text search
/// never matches on the word "null".
pub(crate) fn display_text(series: &Series, row: usize) -> Option<String> {
    match series.get(row) {
        Ok(AnyValue::Null) | Err(_) => None,
        Ok(value) => Some(format!("{}", value)),
    }
}
