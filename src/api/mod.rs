//! API module for the order dashboard
//!
//! Serves every summary table as JSON for a chart front end.

pub mod handlers;
pub mod service;

pub use service::{DashboardService, Selection};

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(service: Arc<DashboardService>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/bounds", get(handlers::get_bounds))
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        // Orders and customers
        .route("/api/v1/orders/daily", get(handlers::get_daily_orders))
        .route("/api/v1/customers/states", get(handlers::get_customer_states))
        .route("/api/v1/customers/cities", get(handlers::get_customer_cities))
        .route("/api/v1/customers/rfm", get(handlers::get_rfm))
        // Delivery delays
        .route("/api/v1/delays/orders", get(handlers::get_delayed_orders))
        .route("/api/v1/delays/monthly", get(handlers::get_delays_by_month))
        .route("/api/v1/delays/cities", get(handlers::get_city_delays))
        // State and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
