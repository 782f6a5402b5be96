//! The `(dataset, range) -> summary tables` contract consumed by the surfaces

use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::aggregate::{
    city_delay_stats, customers_by_state, daily_orders, delayed_orders, delayed_orders_by_month,
    distinct_orders, orders_by_city, rfm, CityDelay, CityOrders, CustomerRfm, DailyOrders,
    DelayedOrder, MonthlyDelays, StateCustomers,
};
use crate::error::FilterError;
use crate::filter::{effective_range, filter_by_date, BoundsPolicy, DateRange};
use crate::loader::Dataset;
use crate::models::OrderRecord;

/// Headline numbers shown above the charts.
///
/// Means are `None` when the filtered range holds no customers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_orders: usize,
    pub total_customers: usize,
    pub delayed_orders: usize,
    /// Mean recency in days, one decimal
    pub avg_recency: Option<f64>,
    /// Mean frequency, two decimals
    pub avg_frequency: Option<f64>,
}

impl SummaryMetrics {
    pub fn from_tables(orders: &[OrderRecord], rfm: &[CustomerRfm], delayed: &[DelayedOrder]) -> Self {
        let customers = rfm.len();
        let (avg_recency, avg_frequency) = if customers == 0 {
            (None, None)
        } else {
            let n = customers as f64;
            let recency = rfm.iter().map(|c| c.recency as f64).sum::<f64>() / n;
            let frequency = rfm.iter().map(|c| c.frequency as f64).sum::<f64>() / n;
            (Some(round_to(recency, 1)), Some(round_to(frequency, 2)))
        };

        Self {
            total_orders: distinct_orders(orders),
            total_customers: customers,
            delayed_orders: distinct_orders_of(delayed),
            avg_recency,
            avg_frequency,
        }
    }
}

/// Every derived table for one filtered working set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub range: Option<DateRange>,
    pub metrics: SummaryMetrics,
    pub daily_orders: Vec<DailyOrders>,
    pub customers_by_state: Vec<StateCustomers>,
    pub orders_by_city: Vec<CityOrders>,
    pub rfm: Vec<CustomerRfm>,
    pub delayed_orders: Vec<DelayedOrder>,
    pub delayed_by_month: Vec<MonthlyDelays>,
    pub city_delays: Vec<CityDelay>,
}

impl DashboardReport {
    /// Compute every table from an already filtered table.
    ///
    /// Delay is detected once and shared by both delay rollups.
    pub fn build(orders: &[OrderRecord]) -> Self {
        let delayed = delayed_orders(orders);
        let rfm_table = rfm(orders);
        let metrics = SummaryMetrics::from_tables(orders, &rfm_table, &delayed);

        Self {
            range: None,
            metrics,
            daily_orders: daily_orders(orders),
            customers_by_state: customers_by_state(orders),
            orders_by_city: orders_by_city(orders),
            rfm: rfm_table,
            delayed_by_month: delayed_orders_by_month(&delayed),
            city_delays: city_delay_stats(&delayed),
            delayed_orders: delayed,
        }
    }

    /// Validate and apply `range`, then build the report.
    ///
    /// `range` on the result is the range actually applied, so a clamped
    /// selection reports only the dates the dataset covers, and `None` when
    /// nothing overlaps.
    pub fn for_range(
        dataset: &Dataset,
        range: DateRange,
        policy: BoundsPolicy,
    ) -> Result<Self, FilterError> {
        let applied = effective_range(dataset, range, policy)?;
        let filtered = match applied {
            Some(r) => filter_by_date(dataset, r, policy)?,
            None => Vec::new(),
        };
        let mut report = Self::build(&filtered);
        report.range = applied;

        info!(
            "Report for {}..={}: {} rows, {} orders, {} delayed",
            range.start(),
            range.end(),
            filtered.len(),
            report.metrics.total_orders,
            report.metrics.delayed_orders
        );

        Ok(report)
    }

    /// Report over the whole dataset
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let mut report = Self::build(dataset.records());
        report.range = DateRange::full(dataset);
        report
    }
}

fn distinct_orders_of(delayed: &[DelayedOrder]) -> usize {
    delayed
        .iter()
        .map(|d| d.order.order_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Round half to even at `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::Row;

    #[test]
    fn metrics_report_no_data_for_empty_table() {
        let report = DashboardReport::build(&[]);
        assert_eq!(
            report.metrics,
            SummaryMetrics {
                total_orders: 0,
                total_customers: 0,
                delayed_orders: 0,
                avg_recency: None,
                avg_frequency: None,
            }
        );
        assert!(report.daily_orders.is_empty());
        assert!(report.city_delays.is_empty());
    }

    #[test]
    fn metrics_are_rounded() {
        let orders = vec![
            Row::new("o1", "a", "2021-01-01").build(),
            Row::new("o2", "a", "2021-01-02").build(),
            Row::new("o3", "b", "2021-01-03").build(),
            Row::new("o4", "c", "2021-01-03").build(),
            Row::new("o5", "c", "2021-01-03").build(),
            Row::new("o6", "c", "2021-01-03").build(),
        ];
        let report = DashboardReport::build(&orders);
        // recency: a=1, b=0, c=0 -> 0.333.. ; frequency: 2, 1, 3 -> 2.0
        assert_eq!(report.metrics.avg_recency, Some(0.3));
        assert_eq!(report.metrics.avg_frequency, Some(2.0));
        assert_eq!(report.metrics.total_orders, 6);
    }

    #[test]
    fn mean_recency_rounds_half_to_even() {
        let orders = vec![
            Row::new("o1", "a", "2021-01-02").build(),
            Row::new("o2", "b", "2021-01-03").build(),
            Row::new("o3", "c", "2021-01-03").build(),
            Row::new("o4", "d", "2021-01-03").build(),
        ];
        // recency: 1, 0, 0, 0 -> 0.25
        assert_eq!(DashboardReport::build(&orders).metrics.avg_recency, Some(0.2));
    }

    #[test]
    fn report_range_is_the_applied_range() {
        let dataset = Dataset::new(vec![
            Row::new("o1", "a", "2021-01-05").build(),
            Row::new("o2", "b", "2021-01-20").build(),
        ]);
        let date = |d: u32| chrono::NaiveDate::from_ymd_opt(2021, 1, d).unwrap();

        let wide = DateRange::new(date(1), date(31)).unwrap();
        let report = DashboardReport::for_range(&dataset, wide, BoundsPolicy::Clamp).unwrap();
        assert_eq!(report.range, Some(DateRange::new(date(5), date(20)).unwrap()));
        assert_eq!(report.metrics.total_orders, 2);

        let before = DateRange::new(date(1), date(4)).unwrap();
        let report = DashboardReport::for_range(&dataset, before, BoundsPolicy::Clamp).unwrap();
        assert_eq!(report.range, None);
        assert_eq!(report.metrics.total_orders, 0);
    }

    #[test]
    fn shared_delay_matches_recomputed_delay() {
        let orders = vec![
            Row::new("o1", "a", "2021-01-01").city("x").delivered("2021-01-09", "2021-01-05").build(),
            Row::new("o2", "b", "2021-02-01").city("y").delivered("2021-02-03", "2021-02-05").build(),
            Row::new("o3", "c", "2021-02-02").city("x").delivered("2021-02-20", "2021-02-10").build(),
        ];
        let report = DashboardReport::build(&orders);
        assert_eq!(report.delayed_by_month, delayed_orders_by_month(&delayed_orders(&orders)));
        assert_eq!(report.city_delays, city_delay_stats(&delayed_orders(&orders)));
        assert_eq!(report.metrics.delayed_orders, 2);
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(1.25, 1), 1.2);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(2.346, 2), 2.35);
        assert_eq!(round_to(2.0, 2), 2.0);
    }
}
