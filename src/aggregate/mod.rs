//! Aggregation engine
//!
//! Each function here is a pure transformation of a filtered order table into
//! one summary table. None of them mutate their input and none depend on the
//! output of another, except the two delay rollups which take the delayed
//! orders table produced by [`delayed_orders`].
//!
//! Order counts are always distinct `order_id` counts: source rows are line
//! items, so one order may appear on several rows.

pub mod delay;
pub mod geography;
pub mod orders;
pub mod rfm;

pub use delay::{
    city_delay_stats, delayed_orders, delayed_orders_by_month, delivery_delay, CityDelay,
    DelayedOrder, MonthlyDelays,
};
pub use geography::{
    customers_by_state, orders_by_city, states_by_customer_count, CityOrders, StateCustomers,
};
pub use orders::{daily_orders, distinct_orders, DailyOrders};
pub use rfm::{rfm, top_customers_by_frequency, top_customers_by_recency, CustomerRfm};

use chrono::TimeDelta;
use std::collections::HashMap;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days in a time difference, rounded toward negative infinity.
/// A delivery 12h past its estimate is 0 days late; 12h early is -1.
pub(crate) fn whole_days(delta: TimeDelta) -> i64 {
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Groups keys in first-seen order, handing each group a slot index
pub(crate) struct FirstSeen<'a> {
    index: HashMap<&'a str, usize>,
    keys: Vec<&'a str>,
}

impl<'a> FirstSeen<'a> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            keys: Vec::new(),
        }
    }

    /// Slot for `key`, allocating a new one on first sight
    pub(crate) fn slot(&mut self, key: &'a str) -> usize {
        let next = self.keys.len();
        let slot = *self.index.entry(key).or_insert(next);
        if slot == next {
            self.keys.push(key);
        }
        slot
    }

    pub(crate) fn into_keys(self) -> Vec<&'a str> {
        self.keys
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::OrderRecord;
    use chrono::{NaiveDate, NaiveDateTime};

    pub fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).unwrap())
            })
            .unwrap()
    }

    /// Row builder for aggregation tests
    pub struct Row(OrderRecord);

    impl Row {
        pub fn new(order_id: &str, customer: &str, purchased: &str) -> Self {
            Row(OrderRecord {
                order_id: order_id.to_string(),
                customer_unique_id: customer.to_string(),
                customer_city: None,
                customer_state: None,
                order_purchase_timestamp: ts(purchased),
                order_delivered_customer_date: None,
                order_estimated_delivery_date: None,
            })
        }

        pub fn city(mut self, city: &str) -> Self {
            self.0.customer_city = Some(city.to_string());
            self
        }

        pub fn state(mut self, state: &str) -> Self {
            self.0.customer_state = Some(state.to_string());
            self
        }

        pub fn delivered(mut self, delivered: &str, estimated: &str) -> Self {
            self.0.order_delivered_customer_date = Some(ts(delivered));
            self.0.order_estimated_delivery_date = Some(ts(estimated));
            self
        }

        pub fn estimated_only(mut self, estimated: &str) -> Self {
            self.0.order_estimated_delivery_date = Some(ts(estimated));
            self
        }

        pub fn build(self) -> OrderRecord {
            self.0
        }
    }
}
