use chrono::NaiveDate;
use thiserror::Error;

/// Rejections raised while validating a date range, before any aggregation runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("Date range {start}..={end} is outside the dataset bounds {min}..={max}")]
    OutOfBounds {
        start: NaiveDate,
        end: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("Dataset is empty, no date range can be validated")]
    EmptyDataset,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
