use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::{whole_days, FirstSeen};
use crate::models::{OrderRecord, YearMonth};

/// An order row delivered strictly after its estimated delivery date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayedOrder {
    #[serde(flatten)]
    pub order: OrderRecord,
    /// Whole days late, always positive
    pub delay: i64,
}

/// Distinct delayed orders purchased in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyDelays {
    pub month: YearMonth,
    pub order_count: usize,
}

/// Mean delay of the delayed orders shipped to one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityDelay {
    pub customer_city: String,
    pub delivery_delay: f64,
}

/// Delay in whole days, or `None` when either date is missing
pub fn delivery_delay(order: &OrderRecord) -> Option<i64> {
    let delivered = order.order_delivered_customer_date?;
    let estimated = order.order_estimated_delivery_date?;
    Some(whole_days(delivered - estimated))
}

/// Rows delivered after their estimate, each paired with its delay.
///
/// Rows missing the delivered or estimated date have an unknown delay and are
/// left out; they count as neither late nor on time.
pub fn delayed_orders(orders: &[OrderRecord]) -> Vec<DelayedOrder> {
    orders
        .iter()
        .filter_map(|order| {
            delivery_delay(order)
                .filter(|&delay| delay > 0)
                .map(|delay| DelayedOrder {
                    order: order.clone(),
                    delay,
                })
        })
        .collect()
}

/// Distinct delayed orders per purchase month, ascending. Months with no
/// delayed orders are absent.
pub fn delayed_orders_by_month(delayed: &[DelayedOrder]) -> Vec<MonthlyDelays> {
    let mut by_month: BTreeMap<YearMonth, HashSet<&str>> = BTreeMap::new();
    for d in delayed {
        by_month
            .entry(d.order.purchase_month())
            .or_default()
            .insert(d.order.order_id.as_str());
    }

    by_month
        .into_iter()
        .map(|(month, ids)| MonthlyDelays {
            month,
            order_count: ids.len(),
        })
        .collect()
}

/// Mean delay per city over delayed rows, worst first.
///
/// The mean is taken over rows, as the delay is a per-row attribute. Ties keep
/// first-seen city order. Rows without a city are skipped.
pub fn city_delay_stats(delayed: &[DelayedOrder]) -> Vec<CityDelay> {
    let mut cities = FirstSeen::new();
    let mut sums: Vec<(i64, usize)> = Vec::new();

    for d in delayed {
        let Some(city) = d.order.customer_city.as_deref() else {
            continue;
        };
        let slot = cities.slot(city);
        if slot == sums.len() {
            sums.push((0, 0));
        }
        sums[slot].0 += d.delay;
        sums[slot].1 += 1;
    }

    let mut table: Vec<CityDelay> = cities
        .into_keys()
        .into_iter()
        .zip(sums)
        .map(|(city, (total, rows))| CityDelay {
            customer_city: city.to_string(),
            delivery_delay: total as f64 / rows as f64,
        })
        .collect();

    table.sort_by(|a, b| b.delivery_delay.total_cmp(&a.delivery_delay));
    table
}
