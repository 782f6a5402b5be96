use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::models::OrderRecord;

/// Distinct orders purchased on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyOrders {
    pub date: NaiveDate,
    pub order_count: usize,
}

/// Distinct orders per purchase day, ascending by date.
///
/// Days without purchases are not synthesized.
pub fn daily_orders(orders: &[OrderRecord]) -> Vec<DailyOrders> {
    let mut by_day: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for order in orders {
        by_day
            .entry(order.purchase_date())
            .or_default()
            .insert(order.order_id.as_str());
    }

    by_day
        .into_iter()
        .map(|(date, ids)| DailyOrders {
            date,
            order_count: ids.len(),
        })
        .collect()
}

/// Number of distinct `order_id` values in the table
pub fn distinct_orders(orders: &[OrderRecord]) -> usize {
    orders
        .iter()
        .map(|o| o.order_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
