use thiserror::Error;

/// Crate-wide error type.
///
/// Cell-level malformation (bad dates, non-numeric rates, unknown billing
/// basis) degrades to null/zero during normalization and derivation and is
/// not represented here. Errors cover whole-run failures and misuse of the
/// API only.
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
