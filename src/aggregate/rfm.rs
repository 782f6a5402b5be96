use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::whole_days;
use crate::models::OrderRecord;

/// Recency/frequency for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRfm {
    pub customer_unique_id: String,
    /// Distinct orders placed by the customer
    pub frequency: usize,
    /// Whole days between the customer's last purchase and the latest
    /// purchase in the table
    pub recency: i64,
}

struct CustomerActivity<'a> {
    last_purchase: NaiveDateTime,
    orders: HashSet<&'a str>,
}

/// One row per distinct customer, ordered by `customer_unique_id`.
///
/// Recency is measured against the latest purchase in `orders` itself, not the
/// wall clock, so it is reproducible for any historical range and never
/// negative.
pub fn rfm(orders: &[OrderRecord]) -> Vec<CustomerRfm> {
    let Some(reference) = orders.iter().map(|o| o.order_purchase_timestamp).max() else {
        return Vec::new();
    };

    let mut customers: BTreeMap<&str, CustomerActivity> = BTreeMap::new();
    for order in orders {
        let activity = customers
            .entry(order.customer_unique_id.as_str())
            .or_insert_with(|| CustomerActivity {
                last_purchase: order.order_purchase_timestamp,
                orders: HashSet::new(),
            });
        activity.last_purchase = activity.last_purchase.max(order.order_purchase_timestamp);
        activity.orders.insert(order.order_id.as_str());
    }

    customers
        .into_iter()
        .map(|(customer, activity)| CustomerRfm {
            customer_unique_id: customer.to_string(),
            frequency: activity.orders.len(),
            recency: whole_days(reference - activity.last_purchase),
        })
        .collect()
}

/// Most recently active customers first (stable on ties)
pub fn top_customers_by_recency(table: &[CustomerRfm], n: usize) -> Vec<CustomerRfm> {
    let mut sorted = table.to_vec();
    sorted.sort_by_key(|c| c.recency);
    sorted.truncate(n);
    sorted
}

/// Most frequent customers first (stable on ties)
pub fn top_customers_by_frequency(table: &[CustomerRfm], n: usize) -> Vec<CustomerRfm> {
    let mut sorted = table.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::Row;

    fn sample() -> Vec<OrderRecord> {
        vec![
            Row::new("o1", "alice", "2021-01-01 10:00:00").build(),
            Row::new("o1", "alice", "2021-01-01 10:00:00").build(),
            Row::new("o2", "alice", "2021-01-05 09:00:00").build(),
            Row::new("o3", "bob", "2021-01-03 12:00:00").build(),
            Row::new("o4", "carol", "2021-01-10 08:00:00").build(),
        ]
    }

    #[test]
    fn computes_frequency_and_recency_per_customer() {
        let table = rfm(&sample());
        assert_eq!(
            table,
            vec![
                CustomerRfm { customer_unique_id: "alice".into(), frequency: 2, recency: 4 },
                CustomerRfm { customer_unique_id: "bob".into(), frequency: 1, recency: 6 },
                CustomerRfm { customer_unique_id: "carol".into(), frequency: 1, recency: 0 },
            ]
        );
    }

    #[test]
    fn single_order_customer_has_zero_recency_only_if_latest() {
        let table = rfm(&sample());
        let zero: Vec<&str> = table
            .iter()
            .filter(|c| c.recency == 0)
            .map(|c| c.customer_unique_id.as_str())
            .collect();
        assert_eq!(zero, vec!["carol"]);
    }

    #[test]
    fn partial_days_round_down() {
        // 23h before the reference purchase is still the same "day" of recency
        let orders = vec![
            Row::new("o1", "a", "2021-01-01 10:00:00").build(),
            Row::new("o2", "b", "2021-01-02 09:00:00").build(),
        ];
        let table = rfm(&orders);
        assert_eq!(table[0].recency, 0);
    }

    #[test]
    fn empty_table_has_no_customers() {
        assert!(rfm(&[]).is_empty());
    }

    #[test]
    fn top_customer_views() {
        let table = rfm(&sample());
        let recent: Vec<String> = top_customers_by_recency(&table, 2)
            .into_iter()
            .map(|c| c.customer_unique_id)
            .collect();
        assert_eq!(recent, vec!["carol", "alice"]);

        let frequent: Vec<String> = top_customers_by_frequency(&table, 2)
            .into_iter()
            .map(|c| c.customer_unique_id)
            .collect();
        assert_eq!(frequent, vec!["alice", "bob"]);
    }
}
