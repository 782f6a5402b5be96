//! Shared business logic for the dashboard API
//!
//! Holds the loaded dataset and turns date selections into filtered tables and
//! reports. Nothing derived is cached: every call recomputes from the dataset.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;

use crate::error::FilterError;
use crate::filter::{filter_by_date, BoundsPolicy, DateRange, OrderTable};
use crate::loader::{Dataset, LoadStats};
use crate::models::parse_date;
use crate::report::DashboardReport;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub rows: usize,
    pub rejected_rows: usize,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// A caller's date selection. Missing ends default to the dataset bounds.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub start: Option<String>,
    pub end: Option<String>,
    pub policy: BoundsPolicy,
}

// ============================================================================
// Dashboard Service
// ============================================================================

pub struct DashboardService {
    dataset: Arc<Dataset>,
    load_stats: LoadStats,
}

impl DashboardService {
    pub fn new(dataset: Dataset, load_stats: LoadStats) -> Self {
        Self {
            dataset: Arc::new(dataset),
            load_stats,
        }
    }

    /// Read the dataset once; it stays read-only for the service lifetime
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let (dataset, stats) = Dataset::from_path(path)?;
        Ok(Self::new(dataset, stats))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn info(&self) -> DatasetInfo {
        let bounds = self.dataset.bounds();
        DatasetInfo {
            rows: self.dataset.len(),
            rejected_rows: self.load_stats.rejected,
            min_date: bounds.map(|(min, _)| min),
            max_date: bounds.map(|(_, max)| max),
        }
    }

    /// Turn a selection into a validated range.
    ///
    /// A missing end takes the dataset bound on that side, widened to the
    /// given end so a one-sided selection is never inverted; only two given
    /// ends can produce `InvertedRange`. Returns `Ok(None)` only when the
    /// selection is open-ended and the dataset is empty, so there is nothing
    /// to default to.
    pub fn resolve_range(&self, selection: &Selection) -> Result<Option<DateRange>, FilterError> {
        let start = parse_end(selection.start.as_deref())?;
        let end = parse_end(selection.end.as_deref())?;
        let bounds = self.dataset.bounds();

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (Some(start), Some(end)),
            (Some(start), None) => (Some(start), bounds.map(|(_, max)| max.max(start))),
            (None, Some(end)) => (bounds.map(|(min, _)| min.min(end)), Some(end)),
            (None, None) => (bounds.map(|(min, _)| min), bounds.map(|(_, max)| max)),
        };

        match (start, end) {
            (Some(start), Some(end)) => DateRange::new(start, end).map(Some),
            _ if selection.policy == BoundsPolicy::Strict => Err(FilterError::EmptyDataset),
            _ => Ok(None),
        }
    }

    /// The working set for a selection
    pub fn filtered(&self, selection: &Selection) -> Result<OrderTable, FilterError> {
        match self.resolve_range(selection)? {
            Some(range) => filter_by_date(&self.dataset, range, selection.policy),
            None => Ok(Vec::new()),
        }
    }

    /// All summary tables for a selection
    pub fn report(&self, selection: &Selection) -> Result<DashboardReport, FilterError> {
        match self.resolve_range(selection)? {
            Some(range) => DashboardReport::for_range(&self.dataset, range, selection.policy),
            None => Ok(DashboardReport::build(&[])),
        }
    }
}

fn parse_end(value: Option<&str>) -> Result<Option<NaiveDate>, FilterError> {
    value
        .map(|s| parse_date(s).ok_or_else(|| FilterError::InvalidDate(s.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
order_id,customer_unique_id,customer_city,customer_state,order_purchase_timestamp,order_delivered_customer_date,order_estimated_delivery_date
o1,c1,santos,SP,2021-01-01 08:00:00,2021-01-10 00:00:00,2021-01-05 00:00:00
o2,c2,recife,PE,2021-01-02 09:00:00,2021-01-03 00:00:00,2021-01-05 00:00:00
o3,c1,santos,SP,2021-02-10 10:00:00,,2021-02-20 00:00:00
";

    fn service() -> DashboardService {
        let (dataset, stats) = Dataset::from_reader(CSV.as_bytes()).unwrap();
        DashboardService::new(dataset, stats)
    }

    fn selection(start: Option<&str>, end: Option<&str>) -> Selection {
        Selection {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
            policy: BoundsPolicy::Clamp,
        }
    }

    #[test]
    fn open_selection_defaults_to_dataset_bounds() {
        let svc = service();
        let range = svc.resolve_range(&Selection::default()).unwrap().unwrap();
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(range.end(), NaiveDate::from_ymd_opt(2021, 2, 10).unwrap());
        assert_eq!(svc.filtered(&Selection::default()).unwrap().len(), 3);
    }

    #[test]
    fn half_open_selection_uses_one_bound() {
        let svc = service();
        let table = svc.filtered(&selection(Some("2021-01-02"), None)).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn one_sided_selection_outside_dataset_is_empty() {
        let svc = service();

        let before = svc.report(&selection(None, Some("2020-12-31"))).unwrap();
        assert_eq!(before.metrics.total_orders, 0);
        assert_eq!(before.range, None);

        let after = svc.report(&selection(Some("2022-01-01"), None)).unwrap();
        assert_eq!(after.metrics.total_orders, 0);
        assert!(svc.filtered(&selection(Some("2022-01-01"), None)).unwrap().is_empty());
    }

    #[test]
    fn one_sided_strict_selection_outside_dataset_is_out_of_bounds() {
        let svc = service();
        let strict = Selection {
            policy: BoundsPolicy::Strict,
            ..selection(None, Some("2020-12-31"))
        };
        assert!(matches!(svc.report(&strict), Err(FilterError::OutOfBounds { .. })));
    }

    #[test]
    fn bad_selection_is_a_filter_error() {
        let svc = service();
        assert!(matches!(
            svc.report(&selection(Some("2021-02-01"), Some("2021-01-01"))),
            Err(FilterError::InvertedRange { .. })
        ));
        assert!(matches!(
            svc.report(&selection(Some("yesterday"), None)),
            Err(FilterError::InvalidDate(_))
        ));
    }

    #[test]
    fn empty_dataset_yields_empty_report() {
        let svc = DashboardService::new(Dataset::default(), LoadStats::default());
        let report = svc.report(&Selection::default()).unwrap();
        assert_eq!(report.metrics.total_orders, 0);
        assert_eq!(report.metrics.avg_recency, None);
        assert_eq!(svc.info().min_date, None);
    }

    #[test]
    fn report_covers_selection() {
        let svc = service();
        let report = svc.report(&selection(Some("2021-01-01"), Some("2021-01-31"))).unwrap();
        assert_eq!(report.metrics.total_orders, 2);
        assert_eq!(report.delayed_orders.len(), 1);
        assert_eq!(report.delayed_orders[0].order.order_id, "o1");
    }
}
