//! REST API handlers for the order dashboard
//!
//! These handlers use the shared DashboardService. Aggregation is CPU-bound,
//! so each request runs it on the blocking pool.

use axum::{
    extract::{rejection::QueryRejection, FromRequestParts, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::service::{DashboardService, Selection};
use crate::aggregate::{
    city_delay_stats, customers_by_state, daily_orders, delayed_orders, delayed_orders_by_month,
    orders_by_city, rfm, states_by_customer_count, top_customers_by_frequency,
    top_customers_by_recency, CityDelay, CityOrders, CustomerRfm, DailyOrders, DelayedOrder,
    MonthlyDelays, StateCustomers,
};
use crate::error::FilterError;
use crate::filter::{BoundsPolicy, DateRange, OrderTable};
use crate::report::{round_to, SummaryMetrics};

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("Invalid sort '{0}', expected 'recency' or 'frequency'")]
    InvalidSort(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),
    #[error("Aggregation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Filter(_) | ApiError::InvalidSort(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Task(e) => {
                tracing::error!(error = ?e, "Aggregation task failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

// ============================================================================
// Response Types (JSON-serializable versions)
// ============================================================================

#[derive(Serialize)]
pub struct BoundsResponse {
    pub rows: usize,
    pub rejected_rows: usize,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct CityDelayResponse {
    pub customer_city: String,
    pub delivery_delay: f64,
}

impl From<CityDelay> for CityDelayResponse {
    fn from(c: CityDelay) -> Self {
        Self {
            customer_city: c.customer_city,
            delivery_delay: round_to(c.delivery_delay, 2),
        }
    }
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub range: Option<DateRange>,
    pub metrics: SummaryMetrics,
    pub daily_orders: Vec<DailyOrders>,
    pub customers_by_state: Vec<StateCustomers>,
    pub orders_by_city: Vec<CityOrders>,
    pub top_customers_by_recency: Vec<CustomerRfm>,
    pub top_customers_by_frequency: Vec<CustomerRfm>,
    pub delayed_by_month: Vec<MonthlyDelays>,
    pub city_delays: Vec<CityDelayResponse>,
}

#[derive(Serialize)]
pub struct TableResponse<T> {
    pub total: usize,
    pub rows: Vec<T>,
}

impl<T> TableResponse<T> {
    fn limited(mut rows: Vec<T>, limit: Option<usize>) -> Self {
        let total = rows.len();
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Self { total, rows }
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// `Query` whose rejections answer with the JSON error body
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub strict: Option<bool>,
    pub limit: Option<usize>,
}

impl RangeQuery {
    fn selection(&self) -> Selection {
        Selection {
            start: self.start.clone(),
            end: self.end.clone(),
            policy: if self.strict.unwrap_or(false) {
                BoundsPolicy::Strict
            } else {
                BoundsPolicy::Clamp
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RfmQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub strict: Option<bool>,
    pub limit: Option<usize>,
    pub sort: Option<String>,
}

impl RfmQuery {
    fn range(&self) -> RangeQuery {
        RangeQuery {
            start: self.start.clone(),
            end: self.end.clone(),
            strict: self.strict,
            limit: self.limit,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<DashboardService>;

/// Run `f` over the filtered table on the blocking pool
async fn with_table<T, F>(service: AppState, selection: Selection, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(OrderTable) -> T + Send + 'static,
{
    let table = tokio::task::spawn_blocking(move || service.filtered(&selection).map(f)).await??;
    Ok(table)
}

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/bounds
pub async fn get_bounds(State(service): State<AppState>) -> Json<BoundsResponse> {
    let info = service.info();
    Json(BoundsResponse {
        rows: info.rows,
        rejected_rows: info.rejected_rows,
        min_date: info.min_date,
        max_date: info.max_date,
    })
}

/// Customers shown per RFM ranking when no `limit` is given
const DEFAULT_TOP_CUSTOMERS: usize = 5;
/// Cities shown per city ranking when no `limit` is given
const DEFAULT_TOP_CITIES: usize = 10;

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let top_customers = params.limit.unwrap_or(DEFAULT_TOP_CUSTOMERS);
    let top_cities = params.limit.unwrap_or(DEFAULT_TOP_CITIES);
    let selection = params.selection();
    let report = tokio::task::spawn_blocking(move || service.report(&selection)).await??;

    Ok(Json(DashboardResponse {
        range: report.range,
        top_customers_by_recency: top_customers_by_recency(&report.rfm, top_customers),
        top_customers_by_frequency: top_customers_by_frequency(&report.rfm, top_customers),
        metrics: report.metrics,
        daily_orders: report.daily_orders,
        customers_by_state: states_by_customer_count(&report.customers_by_state),
        orders_by_city: report.orders_by_city.into_iter().take(top_cities).collect(),
        delayed_by_month: report.delayed_by_month,
        city_delays: report
            .city_delays
            .into_iter()
            .take(top_cities)
            .map(CityDelayResponse::from)
            .collect(),
    }))
}

/// GET /api/v1/orders/daily
pub async fn get_daily_orders(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<TableResponse<DailyOrders>>, ApiError> {
    let rows = with_table(service, params.selection(), |t| daily_orders(&t)).await?;
    Ok(Json(TableResponse::limited(rows, params.limit)))
}

/// GET /api/v1/customers/states
pub async fn get_customer_states(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<TableResponse<StateCustomers>>, ApiError> {
    let rows = with_table(service, params.selection(), |t| {
        states_by_customer_count(&customers_by_state(&t))
    })
    .await?;
    Ok(Json(TableResponse::limited(rows, params.limit)))
}

/// GET /api/v1/customers/cities
pub async fn get_customer_cities(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<TableResponse<CityOrders>>, ApiError> {
    let rows = with_table(service, params.selection(), |t| orders_by_city(&t)).await?;
    Ok(Json(TableResponse::limited(rows, params.limit)))
}

/// GET /api/v1/customers/rfm?sort=recency|frequency
pub async fn get_rfm(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RfmQuery>,
) -> Result<Json<TableResponse<CustomerRfm>>, ApiError> {
    let sort = params.sort.clone();
    if let Some(s) = sort.as_deref() {
        if s != "recency" && s != "frequency" {
            return Err(ApiError::InvalidSort(s.to_string()));
        }
    }

    let table = with_table(service, params.range().selection(), |t| rfm(&t)).await?;
    let total = table.len();
    let rows = match sort.as_deref() {
        Some("recency") => top_customers_by_recency(&table, total),
        Some("frequency") => top_customers_by_frequency(&table, total),
        _ => table,
    };
    Ok(Json(TableResponse::limited(rows, params.limit)))
}

/// GET /api/v1/delays/orders
pub async fn get_delayed_orders(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<TableResponse<DelayedOrder>>, ApiError> {
    let rows = with_table(service, params.selection(), |t| delayed_orders(&t)).await?;
    Ok(Json(TableResponse::limited(rows, params.limit)))
}

/// GET /api/v1/delays/monthly
pub async fn get_delays_by_month(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<TableResponse<MonthlyDelays>>, ApiError> {
    let rows = with_table(service, params.selection(), |t| {
        delayed_orders_by_month(&delayed_orders(&t))
    })
    .await?;
    Ok(Json(TableResponse::limited(rows, params.limit)))
}

/// GET /api/v1/delays/cities
pub async fn get_city_delays(
    State(service): State<AppState>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<TableResponse<CityDelayResponse>>, ApiError> {
    let rows = with_table(service, params.selection(), |t| {
        city_delay_stats(&delayed_orders(&t))
            .into_iter()
            .map(CityDelayResponse::from)
            .collect::<Vec<_>>()
    })
    .await?;
    Ok(Json(TableResponse::limited(rows, params.limit)))
}
