//! KPI aggregation over a record set (usually the filtered view).

use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::debug;

use crate::alerts::{self, AlertThresholds};
use crate::error::TrackError;
use crate::schema::{derived, equipment, status};

/// Point-in-time summary of a record set. Rebuilt on every filter change,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSnapshot {
    pub total: usize,
    pub active: usize,
    pub idle: usize,
    pub maintenance: usize,
    pub total_cost: f64,
    pub alerts: usize,
}

/// Compute the KPI Snapshot for a record set.
///
/// Status buckets use case-insensitive substring matching, so a value like
/// "Active - Night Shift" counts as active, and a status matching none of
/// the recognized substrings increments no bucket. Absent optional columns
/// contribute zero. There are no failure modes beyond a malformed frame.
pub fn snapshot(
    df: &DataFrame,
    evaluated_at: NaiveDateTime,
    thresholds: &AlertThresholds,
) -> Result<KpiSnapshot, TrackError> {
    let snapshot = KpiSnapshot {
        total: df.height(),
        active: status_count(df, status::ACTIVE)?,
        idle: status_count(df, status::IDLE)?,
        maintenance: status_count(df, status::MAINTENANCE)?,
        total_cost: total_cost(df)?,
        alerts: alerts::rule_match_count(df, evaluated_at, thresholds)?,
    };
    debug!(
        total = snapshot.total,
        active = snapshot.active,
        alerts = snapshot.alerts,
        "kpi snapshot"
    );
    Ok(snapshot)
}

/// Count records whose Current Status contains `needle`, case-insensitively.
/// An absent status column counts zero.
pub(crate) fn status_count(df: &DataFrame, needle: &str) -> Result<usize, TrackError> {
    if df.column(equipment::CURRENT_STATUS).is_err() {
        return Ok(0);
    }

    let needle = needle.to_lowercase();
    let mut count = 0;
    for value in df
        .column(equipment::CURRENT_STATUS)?
        .str()?
        .into_iter()
        .flatten()
    {
        if value.to_lowercase().contains(&needle) {
            count += 1;
        }
    }
    Ok(count)
}

/// Sum Estimated Total Cost with nulls as zero; zero when the column is
/// absent, so cost totals never need null-handling downstream.
pub(crate) fn total_cost(df: &DataFrame) -> Result<f64, TrackError> {
    if df.column(derived::ESTIMATED_TOTAL_COST).is_err() {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for value in df
        .column(derived::ESTIMATED_TOTAL_COST)?
        .f64()?
        .into_iter()
        .flatten()
    {
        sum += value;
    }
    Ok(sum)
}
