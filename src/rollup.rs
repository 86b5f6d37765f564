//! Grouped report tables: dimension rollups, value distributions, and the
//! executive summary.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use polars::prelude::*;

use crate::error::TrackError;
use crate::kpi;
use crate::schema::{derived, equipment, export, status};

/// One group in a dimension rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupRow {
    pub key: String,
    pub equipment_count: usize,
    pub total_cost: f64,
    pub avg_days_onsite: f64,
}

#[derive(Default)]
struct GroupTotals {
    count: usize,
    cost: f64,
    days_sum: f64,
    days_n: usize,
}

/// Group records by one dimension and total them.
///
/// Records with a null key are left out. Null costs contribute nothing to the
/// group total; null onsite days are excluded from the average, and a group
/// with no observed days averages to zero. Rows come back sorted by total
/// cost descending, then key ascending.
pub fn by_dimension(df: &DataFrame, dimension: &str) -> Result<Vec<RollupRow>, TrackError> {
    let keys = df
        .column(dimension)
        .map_err(|_| TrackError::MissingColumn(dimension.to_string()))?
        .str()?;
    let costs = df
        .column(derived::ESTIMATED_TOTAL_COST)
        .ok()
        .map(|column| column.f64())
        .transpose()?;
    let days = df
        .column(derived::DAYS_ONSITE)
        .ok()
        .map(|column| column.f64())
        .transpose()?;

    let mut groups: HashMap<String, GroupTotals> = HashMap::new();
    for row in 0..df.height() {
        let key = match keys.get(row) {
            Some(key) => key,
            None => continue,
        };
        let totals = groups.entry(key.to_string()).or_default();
        totals.count += 1;
        if let Some(cost) = costs.and_then(|column| column.get(row)) {
            totals.cost += cost;
        }
        if let Some(onsite) = days.and_then(|column| column.get(row)) {
            totals.days_sum += onsite;
            totals.days_n += 1;
        }
    }

    let mut rows: Vec<RollupRow> = groups
        .into_iter()
        .map(|(key, totals)| RollupRow {
            key,
            equipment_count: totals.count,
            total_cost: totals.cost,
            avg_days_onsite: if totals.days_n > 0 {
                totals.days_sum / totals.days_n as f64
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(rows)
}

/// A rollup as an export table, keyed by the dimension name.
pub fn rollup_dataframe(dimension: &str, rows: &[RollupRow]) -> Result<DataFrame, TrackError> {
    let keys: Vec<&str> = rows.iter().map(|row| row.key.as_str()).collect();
    let counts: Vec<u32> = rows.iter().map(|row| row.equipment_count as u32).collect();
    let costs: Vec<f64> = rows.iter().map(|row| row.total_cost).collect();
    let days: Vec<f64> = rows.iter().map(|row| row.avg_days_onsite).collect();
    Ok(DataFrame::new(vec![
        Column::new(dimension.into(), &keys),
        Column::new(export::EQUIPMENT_COUNT.into(), &counts),
        Column::new(export::TOTAL_COST.into(), &costs),
        Column::new(export::AVG_DAYS_ONSITE.into(), &days),
    ])?)
}

/// One value's share of a distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRow {
    pub value: String,
    pub count: usize,
}

/// Count how often each value occurs in one column, null cells excluded.
/// Rows come back sorted by count descending, then value ascending.
pub fn distribution(df: &DataFrame, column: &str) -> Result<Vec<DistributionRow>, TrackError> {
    let values = df
        .column(column)
        .map_err(|_| TrackError::MissingColumn(column.to_string()))?
        .str()?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values.into_iter().flatten() {
        *counts.entry(value.to_string()).or_default() += 1;
    }

    let mut rows: Vec<DistributionRow> = counts
        .into_iter()
        .map(|(value, count)| DistributionRow { value, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(rows)
}

/// A distribution as a two-column export table.
pub fn distribution_dataframe(rows: &[DistributionRow]) -> Result<DataFrame, TrackError> {
    let values: Vec<&str> = rows.iter().map(|row| row.value.as_str()).collect();
    let counts: Vec<u32> = rows.iter().map(|row| row.count as u32).collect();
    Ok(DataFrame::new(vec![
        Column::new(export::VALUE.into(), &values),
        Column::new(export::COUNT.into(), &counts),
    ])?)
}

/// Headline figures for the report cover sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutiveSummary {
    pub generated_at: NaiveDateTime,
    pub total_equipment: usize,
    pub active_equipment: usize,
    pub total_vendors: usize,
    pub total_cost: f64,
}

/// Summarize a record set as of the given evaluation time.
pub fn executive_summary(
    df: &DataFrame,
    evaluated_at: NaiveDateTime,
) -> Result<ExecutiveSummary, TrackError> {
    let total_vendors = match df.column(equipment::VENDOR) {
        Ok(column) => {
            let mut vendors = BTreeSet::new();
            for vendor in column.str()?.into_iter().flatten() {
                vendors.insert(vendor);
            }
            vendors.len()
        }
        Err(_) => 0,
    };

    Ok(ExecutiveSummary {
        generated_at: evaluated_at,
        total_equipment: df.height(),
        active_equipment: kpi::status_count(df, status::ACTIVE)?,
        total_vendors,
        total_cost: kpi::total_cost(df)?,
    })
}

/// The summary as a one-row export table.
pub fn summary_dataframe(summary: &ExecutiveSummary) -> Result<DataFrame, TrackError> {
    let generated = summary
        .generated_at
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    Ok(DataFrame::new(vec![
        Column::new(export::REPORT_GENERATED.into(), &[generated.as_str()]),
        Column::new(
            export::TOTAL_EQUIPMENT.into(),
            &[summary.total_equipment as u32],
        ),
        Column::new(
            export::ACTIVE_EQUIPMENT.into(),
            &[summary.active_equipment as u32],
        ),
        Column::new(
            export::TOTAL_VENDORS.into(),
            &[summary.total_vendors as u32],
        ),
        Column::new(
            export::TOTAL_ESTIMATED_COST.into(),
            &[summary.total_cost],
        ),
    ])?)
}
