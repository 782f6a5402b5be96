//! REST API Server for the order dashboard
//!
//! Loads the order CSV once at startup and serves the summary tables for any
//! date range.
//!
//! Usage:
//!   ./target/release/api_server [options]
//!
//! Options:
//!   --port PORT       Port to listen on (default: 8080, env DASHBOARD_PORT)
//!   --data PATH       Path to the order CSV (default: data/main_data.csv, env DASHBOARD_DATA)
//!
//! REST endpoints (all accept ?start=YYYY-MM-DD&end=YYYY-MM-DD&strict=bool&limit=N):
//!   GET /api/v1/health              - Health check
//!   GET /api/v1/bounds              - Dataset date bounds
//!   GET /api/v1/dashboard           - Every table plus headline metrics
//!   GET /api/v1/orders/daily        - Distinct orders per day
//!   GET /api/v1/customers/states    - Customers per state
//!   GET /api/v1/customers/cities    - Orders per city
//!   GET /api/v1/customers/rfm       - Recency/frequency (?sort=recency|frequency)
//!   GET /api/v1/delays/orders       - Late deliveries
//!   GET /api/v1/delays/monthly      - Late orders per purchase month
//!   GET /api/v1/delays/cities       - Mean delay per city

use anyhow::Result;
use clap::Parser;
use ecommerce_dashboard::api::{create_router, DashboardService};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "api_server")]
#[command(about = "Serve the order dashboard tables over HTTP")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "DASHBOARD_PORT", default_value = "8080")]
    port: u16,

    /// Order CSV to load at startup
    #[arg(long, env = "DASHBOARD_DATA", default_value = "data/main_data.csv")]
    data: PathBuf,
}

fn print_banner(port: u16, data: &Path) {
    println!("============================================================");
    println!("            E-COMMERCE ORDER DASHBOARD API");
    println!("============================================================");
    println!();
    println!("  Port:     {}", port);
    println!("  Data:     {}", data.display());
    println!("  REST:     http://localhost:{}/api/v1/", port);
    println!();
    println!("REST Endpoints:");
    println!("  GET /api/v1/health              Health check");
    println!("  GET /api/v1/bounds              Dataset bounds");
    println!("  GET /api/v1/dashboard           Full dashboard");
    println!("  GET /api/v1/orders/daily        Daily orders");
    println!("  GET /api/v1/customers/states    Customers by state");
    println!("  GET /api/v1/customers/cities    Orders by city");
    println!("  GET /api/v1/customers/rfm       RFM table");
    println!("  GET /api/v1/delays/orders       Delayed orders");
    println!("  GET /api/v1/delays/monthly      Delays by month");
    println!("  GET /api/v1/delays/cities       Delay by city");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();
    print_banner(args.port, &args.data);

    let data = args.data.clone();
    let service = tokio::task::spawn_blocking(move || DashboardService::load(data)).await??;
    let info = service.info();
    tracing::info!(
        "Dataset ready: {} rows, {:?}..={:?}",
        info.rows,
        info.min_date,
        info.max_date
    );

    let app = create_router(Arc::new(service));
    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
