//! Date-range restriction of the order table
//!
//! Ranges are inclusive calendar dates compared against the calendar day of
//! `order_purchase_timestamp`, so every purchase made on the end date is kept.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FilterError;
use crate::loader::Dataset;
use crate::models::{parse_date, OrderRecord};

/// A filtered working set; always a fresh copy of the matching rows
pub type OrderTable = Vec<OrderRecord>;

/// Inclusive `[start, end]` calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self, FilterError> {
        let start_date =
            parse_date(start).ok_or_else(|| FilterError::InvalidDate(start.to_string()))?;
        let end_date = parse_date(end).ok_or_else(|| FilterError::InvalidDate(end.to_string()))?;
        Self::new(start_date, end_date)
    }

    /// Range spanning the whole dataset
    pub fn full(dataset: &Dataset) -> Option<Self> {
        dataset
            .bounds()
            .map(|(start, end)| Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Intersection with another range, `None` when they do not overlap
    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }
}

/// What to do with a range reaching outside the dataset's first/last purchase day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Intersect with the dataset bounds; no overlap yields an empty table
    #[default]
    Clamp,
    /// Reject any range not fully inside the dataset bounds
    Strict,
}

/// The range actually applied to `dataset` under `policy`.
///
/// `Ok(None)` means nothing can match: the dataset is empty, or a clamped
/// range does not overlap it.
pub fn effective_range(
    dataset: &Dataset,
    range: DateRange,
    policy: BoundsPolicy,
) -> Result<Option<DateRange>, FilterError> {
    match (DateRange::full(dataset), policy) {
        (None, BoundsPolicy::Clamp) => Ok(None),
        (None, BoundsPolicy::Strict) => Err(FilterError::EmptyDataset),
        (Some(bounds), BoundsPolicy::Clamp) => {
            let clamped = range.intersect(&bounds);
            if clamped.is_none() {
                debug!(
                    "Range {}..={} does not overlap dataset {}..={}",
                    range.start, range.end, bounds.start, bounds.end
                );
            }
            Ok(clamped)
        }
        (Some(bounds), BoundsPolicy::Strict) => {
            if range.start < bounds.start || range.end > bounds.end {
                return Err(FilterError::OutOfBounds {
                    start: range.start,
                    end: range.end,
                    min: bounds.start,
                    max: bounds.end,
                });
            }
            Ok(Some(range))
        }
    }
}

/// Restrict `dataset` to the purchases whose calendar day lies in `range`.
///
/// The dataset is never modified. Row order follows the dataset, which is
/// ascending by purchase timestamp.
pub fn filter_by_date(
    dataset: &Dataset,
    range: DateRange,
    policy: BoundsPolicy,
) -> Result<OrderTable, FilterError> {
    let Some(effective) = effective_range(dataset, range, policy)? else {
        return Ok(Vec::new());
    };

    let table: OrderTable = dataset
        .records()
        .iter()
        .filter(|r| effective.contains(r.purchase_date()))
        .cloned()
        .collect();

    debug!(
        "Filtered {} of {} rows for {}..={}",
        table.len(),
        dataset.len(),
        effective.start,
        effective.end
    );

    Ok(table)
}
