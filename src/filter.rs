//! Dimension filters, distinct-value options, and free-text search.

use std::collections::BTreeSet;

use polars::prelude::*;
use tracing::debug;

use crate::cell;
use crate::error::TrackError;
use crate::schema::{equipment, filters};

/// One dimension's selection state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    /// No constraint on this dimension.
    #[default]
    All,
    /// Keep records whose cell equals the value exactly.
    Equals(String),
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        if value == filters::ALL {
            Selection::All
        } else {
            Selection::Equals(value.to_string())
        }
    }
}

/// Selections across the filterable dimensions, combined as a conjunction.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub vendor: Selection,
    pub status: Selection,
    pub category: Selection,
    pub payment_type: Selection,
    pub phase: Selection,
}

impl FilterCriteria {
    fn selections(&self) -> [(&'static str, &Selection); 5] {
        [
            (equipment::VENDOR, &self.vendor),
            (equipment::CURRENT_STATUS, &self.status),
            (equipment::CATEGORY, &self.category),
            (equipment::PAYMENT_TYPE, &self.payment_type),
            (equipment::PHASE, &self.phase),
        ]
    }
}

/// Keep the records matching every selected dimension value.
///
/// A selection on a dimension the record set does not carry is left
/// unconstrained. Null cells never match an `Equals` selection.
pub fn apply(df: &DataFrame, criteria: &FilterCriteria) -> Result<DataFrame, TrackError> {
    let mut predicate: Option<Expr> = None;
    for (dimension, selection) in criteria.selections() {
        let value = match selection {
            Selection::All => continue,
            Selection::Equals(value) => value,
        };
        if df.column(dimension).is_err() {
            debug!(dimension, "filter dimension absent, selection left unconstrained");
            continue;
        }
        let clause = col(dimension).eq(lit(value.as_str()));
        predicate = Some(match predicate {
            Some(existing) => existing.and(clause),
            None => clause,
        });
    }
    match predicate {
        Some(predicate) => Ok(df.clone().lazy().filter(predicate).collect()?),
        None => Ok(df.clone()),
    }
}

/// The values a filter control can offer for one dimension.
#[derive(Debug, Clone)]
pub struct DimensionValues {
    pub dimension: String,
    pub values: Vec<String>,
}

/// Distinct values per filterable dimension, each list led by the `All`
/// sentinel and sorted. Dimensions the record set does not carry are skipped.
pub fn options(df: &DataFrame) -> Result<Vec<DimensionValues>, TrackError> {
    let mut all = Vec::new();
    for dimension in filters::DIMENSIONS {
        let column = match df.column(dimension) {
            Ok(column) => column,
            Err(_) => continue,
        };
        let mut distinct = BTreeSet::new();
        for value in column.str()?.into_iter().flatten() {
            distinct.insert(value.to_string());
        }
        let mut values = Vec::with_capacity(distinct.len() + 1);
        values.push(filters::ALL.to_string());
        values.extend(distinct);
        all.push(DimensionValues {
            dimension: dimension.to_string(),
            values,
        });
    }
    Ok(all)
}

/// Keep records where any cell's display text contains the query,
/// case-insensitively. A blank query keeps every record.
pub fn search(df: &DataFrame, query: &str) -> Result<DataFrame, TrackError> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(df.clone());
    }
    let mut mask = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let hit = df.get_columns().iter().any(|column| {
            cell::display_text(column.as_materialized_series(), row)
                .map(|text| text.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
        mask.push(hit);
    }
    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(df.filter(&mask)?)
}
