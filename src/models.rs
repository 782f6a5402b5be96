use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layouts seen in the order exports, tried in order
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw row from the cleaned order CSV
///
/// Only the columns used by the dashboard are declared; any other columns in
/// the export are ignored by the deserializer.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvRecord {
    pub order_id: String,
    pub customer_unique_id: String,
    #[serde(default)]
    pub customer_city: Option<String>,
    #[serde(default)]
    pub customer_state: Option<String>,
    pub order_purchase_timestamp: String,
    #[serde(default)]
    pub order_delivered_customer_date: Option<String>,
    #[serde(default)]
    pub order_estimated_delivery_date: Option<String>,
}

/// One line item of an order, as used by every aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_unique_id: String,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
    pub order_purchase_timestamp: NaiveDateTime,
    pub order_delivered_customer_date: Option<NaiveDateTime>,
    pub order_estimated_delivery_date: Option<NaiveDateTime>,
}

impl OrderRecord {
    /// Calendar day of the purchase
    pub fn purchase_date(&self) -> NaiveDate {
        self.order_purchase_timestamp.date()
    }

    /// Calendar month of the purchase
    pub fn purchase_month(&self) -> YearMonth {
        YearMonth::from(self.order_purchase_timestamp.date())
    }
}

impl CsvRecord {
    pub fn to_order(&self) -> anyhow::Result<OrderRecord> {
        let order_id = self.order_id.trim();
        let customer_unique_id = self.customer_unique_id.trim();
        if order_id.is_empty() {
            anyhow::bail!("missing order_id");
        }
        if customer_unique_id.is_empty() {
            anyhow::bail!("missing customer_unique_id for order {}", order_id);
        }

        let order_purchase_timestamp = parse_timestamp(&self.order_purchase_timestamp)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "invalid order_purchase_timestamp '{}' for order {}",
                    self.order_purchase_timestamp,
                    order_id
                )
            })?;

        Ok(OrderRecord {
            order_id: order_id.to_string(),
            customer_unique_id: customer_unique_id.to_string(),
            customer_city: non_empty(self.customer_city.as_deref()),
            customer_state: non_empty(self.customer_state.as_deref()),
            order_purchase_timestamp,
            order_delivered_customer_date: self
                .order_delivered_customer_date
                .as_deref()
                .and_then(parse_timestamp),
            order_estimated_delivery_date: self
                .order_estimated_delivery_date
                .as_deref()
                .and_then(parse_timestamp),
        })
    }
}

/// Parse a timestamp cell, accepting full datetimes or bare dates.
/// Blank cells and unknown layouts give `None`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Year + month bucket, displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for YearMonth {
    fn from(d: NaiveDate) -> Self {
        YearMonth {
            year: d.year(),
            month: d.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_record(purchase: &str) -> CsvRecord {
        CsvRecord {
            order_id: "o1".to_string(),
            customer_unique_id: "c1".to_string(),
            customer_city: Some("sao paulo".to_string()),
            customer_state: Some(" ".to_string()),
            order_purchase_timestamp: purchase.to_string(),
            order_delivered_customer_date: Some(String::new()),
            order_estimated_delivery_date: Some("2021-01-05".to_string()),
        }
    }

    #[test]
    fn parses_supported_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2021, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2021-01-02 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-01-02T10:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2021-01-02"),
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("  "), None);
        assert_eq!(parse_timestamp("02/01/2021"), None);
    }

    #[test]
    fn blank_optional_cells_become_none() {
        let order = csv_record("2021-01-02 10:30:00").to_order().unwrap();
        assert_eq!(order.customer_state, None);
        assert_eq!(order.customer_city.as_deref(), Some("sao paulo"));
        assert_eq!(order.order_delivered_customer_date, None);
        assert!(order.order_estimated_delivery_date.is_some());
    }

    #[test]
    fn missing_purchase_timestamp_is_rejected() {
        assert!(csv_record("").to_order().is_err());
        assert!(csv_record("not a date").to_order().is_err());
    }

    #[test]
    fn year_month_formats_and_orders() {
        let jan = YearMonth::from(NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
        let dec = YearMonth::from(NaiveDate::from_ymd_opt(2020, 12, 1).unwrap());
        assert_eq!(jan.to_string(), "2021-01");
        assert!(dec < jan);
        assert_eq!(serde_json::to_string(&jan).unwrap(), "\"2021-01\"");
    }
}
