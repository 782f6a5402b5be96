use serde::Serialize;
use std::collections::HashSet;

use super::FirstSeen;
use crate::models::OrderRecord;

/// Distinct customers living in one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCustomers {
    pub customer_state: String,
    pub customer_count: usize,
}

/// Distinct orders shipped to one city
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityOrders {
    pub customer_city: String,
    pub order_count: usize,
}

/// Distinct `customer_unique_id` per state.
///
/// Rows without a state are skipped. Groups come out in the order their state
/// first appears in the table; callers sort for display.
pub fn customers_by_state(orders: &[OrderRecord]) -> Vec<StateCustomers> {
    let mut states = FirstSeen::new();
    let mut customers: Vec<HashSet<&str>> = Vec::new();

    for order in orders {
        let Some(state) = order.customer_state.as_deref() else {
            continue;
        };
        let slot = states.slot(state);
        if slot == customers.len() {
            customers.push(HashSet::new());
        }
        customers[slot].insert(order.customer_unique_id.as_str());
    }

    states
        .into_keys()
        .into_iter()
        .zip(customers)
        .map(|(state, ids)| StateCustomers {
            customer_state: state.to_string(),
            customer_count: ids.len(),
        })
        .collect()
}

/// States sorted by customer count, largest first (stable on ties)
pub fn states_by_customer_count(states: &[StateCustomers]) -> Vec<StateCustomers> {
    let mut sorted = states.to_vec();
    sorted.sort_by(|a, b| b.customer_count.cmp(&a.customer_count));
    sorted
}

/// Distinct `order_id` per city, largest first.
///
/// Ties keep first-seen order: the city whose earliest row comes first in the
/// (chronological) table wins. Rows without a city are skipped.
pub fn orders_by_city(orders: &[OrderRecord]) -> Vec<CityOrders> {
    let mut cities = FirstSeen::new();
    let mut order_ids: Vec<HashSet<&str>> = Vec::new();

    for order in orders {
        let Some(city) = order.customer_city.as_deref() else {
            continue;
        };
        let slot = cities.slot(city);
        if slot == order_ids.len() {
            order_ids.push(HashSet::new());
        }
        order_ids[slot].insert(order.order_id.as_str());
    }

    let mut table: Vec<CityOrders> = cities
        .into_keys()
        .into_iter()
        .zip(order_ids)
        .map(|(city, ids)| CityOrders {
            customer_city: city.to_string(),
            order_count: ids.len(),
        })
        .collect();

    table.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::Row;

    #[test]
    fn state_counts_are_distinct_customers() {
        let orders = vec![
            Row::new("o1", "c1", "2021-01-01").state("SP").build(),
            Row::new("o2", "c1", "2021-01-02").state("SP").build(),
            Row::new("o3", "c2", "2021-01-02").state("RJ").build(),
            Row::new("o4", "c3", "2021-01-03").state("SP").build(),
            Row::new("o5", "c4", "2021-01-03").build(),
        ];

        let states = customers_by_state(&orders);
        assert_eq!(
            states,
            vec![
                StateCustomers { customer_state: "SP".into(), customer_count: 2 },
                StateCustomers { customer_state: "RJ".into(), customer_count: 1 },
            ]
        );

        // c4 has no state, so the sum stays below the distinct customer count
        let total: usize = states.iter().map(|s| s.customer_count).sum();
        assert!(total <= 4);
    }

    #[test]
    fn sorted_states_put_largest_first() {
        let states = vec![
            StateCustomers { customer_state: "RJ".into(), customer_count: 1 },
            StateCustomers { customer_state: "SP".into(), customer_count: 5 },
            StateCustomers { customer_state: "MG".into(), customer_count: 1 },
        ];
        let sorted: Vec<String> = states_by_customer_count(&states)
            .into_iter()
            .map(|s| s.customer_state)
            .collect();
        assert_eq!(sorted, vec!["SP", "RJ", "MG"]);
    }

    #[test]
    fn city_volume_counts_orders_not_rows() {
        let orders = vec![
            Row::new("o1", "c1", "2021-01-01").city("curitiba").build(),
            Row::new("o1", "c1", "2021-01-01").city("curitiba").build(),
            Row::new("o2", "c2", "2021-01-02").city("santos").build(),
            Row::new("o3", "c3", "2021-01-03").city("santos").build(),
        ];

        let cities = orders_by_city(&orders);
        assert_eq!(
            cities,
            vec![
                CityOrders { customer_city: "santos".into(), order_count: 2 },
                CityOrders { customer_city: "curitiba".into(), order_count: 1 },
            ]
        );
    }

    #[test]
    fn city_ties_keep_first_seen_order() {
        let orders = vec![
            Row::new("o1", "c1", "2021-01-01").city("recife").build(),
            Row::new("o2", "c2", "2021-01-02").city("belem").build(),
            Row::new("o3", "c3", "2021-01-03").city("natal").build(),
            Row::new("o4", "c4", "2021-01-04").city("natal").build(),
        ];

        let names: Vec<String> = orders_by_city(&orders)
            .into_iter()
            .map(|c| c.customer_city)
            .collect();
        assert_eq!(names, vec!["natal", "recife", "belem"]);
    }
}
