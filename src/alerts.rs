//! Exception detection: overdue inspections and duration overruns.

use chrono::NaiveDateTime;
use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::debug;

use crate::error::TrackError;
use crate::schema::{derived, equipment};

/// Thresholds for the alert rules.
#[derive(Debug, Clone)]
pub struct AlertThresholds {
    /// A Duration Variance strictly greater than this many days is an
    /// overrun.
    pub overrun_days: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self { overrun_days: 7.0 }
    }
}

/// Per-rule drill-down subsets plus both alert totals.
///
/// `rule_matches` sums the per-rule counts, so a record violating both rules
/// is counted twice - the figure the KPI Snapshot reports. `distinct_records`
/// counts each flagged record once, for consumers that want one alert per
/// record.
#[derive(Debug, Clone)]
pub struct AlertReport {
    pub overdue_inspections: DataFrame,
    pub duration_overruns: DataFrame,
    pub rule_matches: usize,
    pub distinct_records: usize,
}

/// Evaluate both alert rules against a record set.
///
/// A rule whose input column is absent matches nothing. Null cells never
/// match either rule.
pub fn detect(
    df: &DataFrame,
    evaluated_at: NaiveDateTime,
    thresholds: &AlertThresholds,
) -> Result<AlertReport, TrackError> {
    let now_us = evaluated_at.and_utc().timestamp_micros();

    let overdue_inspections = subset(df, overdue_predicate(df, now_us))?;
    let duration_overruns = subset(df, overrun_predicate(df, thresholds.overrun_days))?;
    let rule_matches = overdue_inspections.height() + duration_overruns.height();

    let either = match (
        overdue_predicate(df, now_us),
        overrun_predicate(df, thresholds.overrun_days),
    ) {
        (Some(overdue), Some(overrun)) => Some(overdue.or(overrun)),
        (Some(overdue), None) => Some(overdue),
        (None, Some(overrun)) => Some(overrun),
        (None, None) => None,
    };
    let distinct_records = subset(df, either)?.height();

    debug!(rule_matches, distinct_records, "alert detection");
    Ok(AlertReport {
        overdue_inspections,
        duration_overruns,
        rule_matches,
        distinct_records,
    })
}

/// Sum of per-rule match counts, as reported by the KPI Snapshot.
pub(crate) fn rule_match_count(
    df: &DataFrame,
    evaluated_at: NaiveDateTime,
    thresholds: &AlertThresholds,
) -> Result<usize, TrackError> {
    let now_us = evaluated_at.and_utc().timestamp_micros();
    let overdue = subset(df, overdue_predicate(df, now_us))?.height();
    let overruns = subset(df, overrun_predicate(df, thresholds.overrun_days))?.height();
    Ok(overdue + overruns)
}

fn overdue_predicate(df: &DataFrame, now_us: i64) -> Option<Expr> {
    if df.column(equipment::NEXT_INSPECTION_DUE).is_err() {
        return None;
    }
    let now = lit(now_us).cast(DataType::Datetime(TimeUnit::Microseconds, None));
    Some(col(equipment::NEXT_INSPECTION_DUE).lt(now))
}

fn overrun_predicate(df: &DataFrame, overrun_days: f64) -> Option<Expr> {
    if df.column(derived::DURATION_VARIANCE).is_err() {
        return None;
    }
    Some(col(derived::DURATION_VARIANCE).gt(lit(overrun_days)))
}

fn subset(df: &DataFrame, predicate: Option<Expr>) -> Result<DataFrame, TrackError> {
    match predicate {
        Some(predicate) => Ok(df.clone().lazy().filter(predicate).collect()?),
        None => Ok(df.head(Some(0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn eval_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn us_offset(days: i64) -> i64 {
        (eval_time() + Duration::days(days))
            .and_utc()
            .timestamp_micros()
    }

    fn datetime_column(name: &str, timestamps: &[Option<i64>]) -> Column {
        Series::new(name.into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
            .unwrap()
            .into()
    }

    #[test]
    fn record_violating_both_rules_counts_twice() {
        let df = DataFrame::new(vec![
            datetime_column(equipment::NEXT_INSPECTION_DUE, &[Some(us_offset(-1))]),
            Column::new(derived::DURATION_VARIANCE.into(), &[Some(10.0)]),
        ])
        .unwrap();

        let report = detect(&df, eval_time(), &AlertThresholds::default()).unwrap();
        assert_eq!(report.rule_matches, 2);
        assert_eq!(report.distinct_records, 1);
        assert_eq!(report.overdue_inspections.height(), 1);
        assert_eq!(report.duration_overruns.height(), 1);
    }

    #[test]
    fn future_due_dates_and_small_variance_do_not_fire() {
        let df = DataFrame::new(vec![
            datetime_column(
                equipment::NEXT_INSPECTION_DUE,
                &[Some(us_offset(1)), None],
            ),
            Column::new(derived::DURATION_VARIANCE.into(), &[Some(7.0), None]),
        ])
        .unwrap();

        // Variance of exactly 7 is not an overrun; the limit is strict.
        let report = detect(&df, eval_time(), &AlertThresholds::default()).unwrap();
        assert_eq!(report.rule_matches, 0);
        assert_eq!(report.distinct_records, 0);
    }

    #[test]
    fn custom_threshold_changes_overrun_rule() {
        let df = DataFrame::new(vec![Column::new(
            derived::DURATION_VARIANCE.into(),
            &[Some(5.0), Some(2.0)],
        )])
        .unwrap();

        let thresholds = AlertThresholds { overrun_days: 3.0 };
        let report = detect(&df, eval_time(), &thresholds).unwrap();
        assert_eq!(report.rule_matches, 1);
        assert_eq!(report.duration_overruns.height(), 1);
    }

    #[test]
    fn absent_rule_columns_match_nothing() {
        let df = DataFrame::new(vec![Column::new(
            equipment::EQUIPMENT_DESCRIPTION.into(),
            &[Some("Crane")],
        )])
        .unwrap();

        let report = detect(&df, eval_time(), &AlertThresholds::default()).unwrap();
        assert_eq!(report.rule_matches, 0);
        assert_eq!(report.distinct_records, 0);
        assert_eq!(report.overdue_inspections.height(), 0);
        assert_eq!(report.duration_overruns.height(), 0);
    }

    #[test]
    fn drill_down_subsets_keep_full_rows() {
        let df = DataFrame::new(vec![
            Column::new(
                equipment::EQUIPMENT_DESCRIPTION.into(),
                &[Some("Crane"), Some("Pump")],
            ),
            datetime_column(
                equipment::NEXT_INSPECTION_DUE,
                &[Some(us_offset(-2)), Some(us_offset(5))],
            ),
        ])
        .unwrap();

        let report = detect(&df, eval_time(), &AlertThresholds::default()).unwrap();
        assert_eq!(report.overdue_inspections.height(), 1);
        let names = report
            .overdue_inspections
            .column(equipment::EQUIPMENT_DESCRIPTION)
            .unwrap()
            .str()
            .unwrap();
        assert_eq!(names.get(0), Some("Crane"));
    }
}
