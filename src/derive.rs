//! Derived fields: time on site, duration variance, and billing-basis cost.
//!
//! All three are pure functions of a record's own normalized fields and the
//! evaluation timestamp captured once per run. A derived column is only added
//! when its input columns are present, so a sparse source file simply yields
//! a sparse canonical set.

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::debug;

use crate::cell;
use crate::error::TrackError;
use crate::schema::{billing, derived, equipment};

const US_PER_DAY: i64 = 86_400_000_000;

/// Add the derived columns to a normalized record set in a single pass.
///
/// `evaluated_at` is the run's single clock reading; it is never re-read
/// here, so every record in one run is mutually time-consistent.
pub fn with_derived_fields(
    df: DataFrame,
    evaluated_at: NaiveDateTime,
) -> Result<DataFrame, TrackError> {
    let now_us = evaluated_at.and_utc().timestamp_micros();
    let df = add_days_onsite(df, now_us)?;
    let df = add_duration_variance(df)?;
    let df = add_estimated_cost(df)?;
    Ok(df)
}

/// Days Onsite = whole days from Mobilization Date to the evaluation time,
/// clamped at zero for future mobilizations. Null mobilization stays null.
fn add_days_onsite(mut df: DataFrame, now_us: i64) -> Result<DataFrame, TrackError> {
    if df.column(equipment::MOBILIZATION_DATE).is_err() {
        return Ok(df);
    }

    let mobilized = df
        .column(equipment::MOBILIZATION_DATE)?
        .as_materialized_series();
    let mut days: Vec<Option<f64>> = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        days.push(
            cell::datetime_us(mobilized, row)
                .map(|us| (now_us - us).div_euclid(US_PER_DAY).max(0) as f64),
        );
    }

    let series = Series::new(derived::DAYS_ONSITE.into(), &days);
    df.with_column(series)?;
    Ok(df)
}

/// Duration Variance = Days Onsite - Planned Duration; null when either
/// input is null. Needs both columns.
fn add_duration_variance(mut df: DataFrame) -> Result<DataFrame, TrackError> {
    if df.column(derived::DAYS_ONSITE).is_err()
        || df.column(equipment::PLANNED_DURATION_DAYS).is_err()
    {
        return Ok(df);
    }

    let days = df.column(derived::DAYS_ONSITE)?.f64()?;
    let planned = df.column(equipment::PLANNED_DURATION_DAYS)?.f64()?;
    let mut variance: Vec<Option<f64>> = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        variance.push(match (days.get(row), planned.get(row)) {
            (Some(onsite), Some(expected)) => Some(onsite - expected),
            _ => None,
        });
    }

    let series = Series::new(derived::DURATION_VARIANCE.into(), &variance);
    df.with_column(series)?;
    Ok(df)
}

/// Estimated Total Cost from the billing-basis switch. The column is added
/// only when Unit Rate, Days Onsite, and Billing Basis all exist, and is
/// never null: missing inputs and unrecognized bases cost zero.
fn add_estimated_cost(mut df: DataFrame) -> Result<DataFrame, TrackError> {
    if df.column(equipment::UNIT_RATE).is_err()
        || df.column(derived::DAYS_ONSITE).is_err()
        || df.column(equipment::BILLING_BASIS).is_err()
    {
        return Ok(df);
    }

    let rates = df.column(equipment::UNIT_RATE)?.f64()?;
    let days = df.column(derived::DAYS_ONSITE)?.f64()?;
    let bases = df.column(equipment::BILLING_BASIS)?.str()?;

    let mut costs: Vec<f64> = Vec::with_capacity(df.height());
    let mut unknown_basis = 0usize;
    for row in 0..df.height() {
        let onsite = days.get(row).unwrap_or(0.0);
        let rate = rates.get(row).unwrap_or(0.0);
        let cost = match bases.get(row) {
            Some(billing::DAILY) => onsite * rate,
            Some(billing::WEEKLY) => onsite / 7.0 * rate,
            Some(billing::MONTHLY) => onsite / 30.0 * rate,
            Some(_) => {
                unknown_basis += 1;
                0.0
            }
            None => 0.0,
        };
        costs.push(cost);
    }

    if unknown_basis > 0 {
        debug!(
            rows = unknown_basis,
            "unrecognized billing basis, cost kept at zero"
        );
    }

    let series = Series::new(derived::ESTIMATED_TOTAL_COST.into(), &costs);
    df.with_column(series)?;
    Ok(df)
}
