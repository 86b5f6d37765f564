//! Data engine for equipment-tracking spreadsheets.
//!
//! The pipeline reads a raw CSV export with every cell as text, normalizes
//! known header variants and cell values onto a canonical schema, derives
//! onsite days, duration variance, and estimated cost, and answers filtered
//! queries: KPI snapshots, alert reports, rollups, distributions, and the
//! executive summary. [`TrackerModel`] ties the stages together and caches
//! the parsed records per source file.

pub mod alerts;
mod cell;
pub mod derive;
pub mod error;
pub mod filter;
pub mod kpi;
pub mod model;
pub mod normalize;
pub mod rollup;
pub mod schema;

pub use crate::alerts::{AlertReport, AlertThresholds};
pub use crate::error::TrackError;
pub use crate::filter::{DimensionValues, FilterCriteria, Selection};
pub use crate::kpi::KpiSnapshot;
pub use crate::model::TrackerModel;
pub use crate::rollup::{DistributionRow, ExecutiveSummary, RollupRow};
