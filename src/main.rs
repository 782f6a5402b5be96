//! Terminal rendition of the order dashboard
//!
//! Run: ./target/release/ecommerce_dashboard [section] [--start DATE] [--end DATE]
//! Sections: all, orders, customers, rfm, delays

use anyhow::Result;
use clap::{Parser, ValueEnum};
use ecommerce_dashboard::aggregate::{
    states_by_customer_count, top_customers_by_frequency, top_customers_by_recency,
};
use ecommerce_dashboard::api::{DashboardService, Selection};
use ecommerce_dashboard::filter::BoundsPolicy;
use ecommerce_dashboard::report::DashboardReport;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    All,
    Orders,
    Customers,
    Rfm,
    Delays,
}

#[derive(Parser, Debug)]
#[command(name = "ecommerce_dashboard")]
#[command(about = "Print the order dashboard for a date range")]
struct Args {
    /// Section to print
    #[arg(value_enum, default_value = "all")]
    section: Section,

    /// Order CSV to load
    #[arg(long, env = "DASHBOARD_DATA", default_value = "data/main_data.csv")]
    data: PathBuf,

    /// First purchase date to include (YYYY-MM-DD), defaults to the dataset start
    #[arg(long)]
    start: Option<String>,

    /// Last purchase date to include (YYYY-MM-DD), defaults to the dataset end
    #[arg(long)]
    end: Option<String>,

    /// Reject ranges reaching outside the dataset instead of clamping
    #[arg(long)]
    strict: bool,

    /// Customers shown in the recency and frequency rankings
    #[arg(long, default_value = "5")]
    top: usize,

    /// Cities shown in the order volume and delay rankings
    #[arg(long, default_value = "10")]
    top_cities: usize,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn fmt_metric(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "no data".to_string(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let service = DashboardService::load(&args.data)?;

    let selection = Selection {
        start: args.start.clone(),
        end: args.end.clone(),
        policy: if args.strict {
            BoundsPolicy::Strict
        } else {
            BoundsPolicy::Clamp
        },
    };
    let report = service.report(&selection)?;
    info!("Report ready");

    println!("\n{}", "█".repeat(80));
    println!("{}  E-COMMERCE ORDER DASHBOARD  {}", "█".repeat(24), "█".repeat(25));
    println!("{}\n", "█".repeat(80));

    match report.range {
        Some(range) => println!("  Range: {} to {}", range.start(), range.end()),
        None => println!("  Range: (no data in selection)"),
    }

    let sections = match args.section {
        Section::All => vec![Section::Orders, Section::Customers, Section::Rfm, Section::Delays],
        s => vec![s],
    };

    for section in sections {
        match section {
            Section::Orders => print_orders(&report),
            Section::Customers => print_customers(&report, args.top_cities),
            Section::Rfm => print_rfm(&report, args.top),
            Section::Delays => print_delays(&report, args.top_cities),
            Section::All => {}
        }
    }

    println!("\n{}", "█".repeat(80));
    Ok(())
}

fn print_orders(report: &DashboardReport) {
    print_section_header("1. DAILY ORDERS");

    println!("  Total Orders:         {:>12}", report.metrics.total_orders);
    println!("  Active Days:          {:>12}", report.daily_orders.len());

    print_subsection("Orders per Day");
    println!("  {:12} {:>8}  {}", "Date", "Orders", "Visual");
    println!("  {}", "-".repeat(54));

    let peak = report.daily_orders.iter().map(|d| d.order_count).max().unwrap_or(0);
    for day in &report.daily_orders {
        let bar_len = if peak > 0 { day.order_count * 40 / peak } else { 0 };
        println!("  {:12} {:>8}  {}", day.date.to_string(), day.order_count, "#".repeat(bar_len));
    }
}

fn print_customers(report: &DashboardReport, top: usize) {
    print_section_header("2. CUSTOMER DEMOGRAPHICS");

    print_subsection("Customers by State");
    println!("  {:8} {:>10}", "State", "Customers");
    println!("  {}", "-".repeat(20));
    for state in states_by_customer_count(&report.customers_by_state) {
        println!("  {:8} {:>10}", state.customer_state, state.customer_count);
    }

    print_subsection(&format!("Top {} Cities by Orders", top));
    println!("  {:32} {:>8}", "City", "Orders");
    println!("  {}", "-".repeat(42));
    for city in report.orders_by_city.iter().take(top) {
        println!("  {:32} {:>8}", city.customer_city, city.order_count);
    }
}

fn print_rfm(report: &DashboardReport, top: usize) {
    print_section_header("3. BEST CUSTOMERS (RFM)");

    println!("  Customers:            {:>12}", report.metrics.total_customers);
    println!("  Avg Recency (days):   {:>12}", fmt_metric(report.metrics.avg_recency, 1));
    println!("  Avg Frequency:        {:>12}", fmt_metric(report.metrics.avg_frequency, 2));

    print_subsection(&format!("Top {} by Recency", top));
    println!("  {:34} {:>8}", "Customer", "Days");
    for c in top_customers_by_recency(&report.rfm, top) {
        println!("  {:34} {:>8}", c.customer_unique_id, c.recency);
    }

    print_subsection(&format!("Top {} by Frequency", top));
    println!("  {:34} {:>8}", "Customer", "Orders");
    for c in top_customers_by_frequency(&report.rfm, top) {
        println!("  {:34} {:>8}", c.customer_unique_id, c.frequency);
    }
}

fn print_delays(report: &DashboardReport, top: usize) {
    print_section_header("4. DELIVERY DELAYS");

    let total = report.metrics.total_orders;
    let late = report.metrics.delayed_orders;
    let late_rate = if total > 0 { late as f64 / total as f64 * 100.0 } else { 0.0 };

    println!("  Delayed Orders:       {:>12}", late);
    println!("  Late Rate:            {:>11.1}%", late_rate);

    print_subsection(&format!("Top {} Cities by Mean Delay", top));
    println!("  {:32} {:>12}", "City", "Avg Delay");
    println!("  {}", "-".repeat(46));
    for city in report.city_delays.iter().take(top) {
        println!("  {:32} {:>9.2} d", city.customer_city, city.delivery_delay);
    }

    print_subsection("Delayed Orders per Purchase Month");
    println!("  {:10} {:>8}", "Month", "Orders");
    println!("  {}", "-".repeat(20));
    for month in &report.delayed_by_month {
        println!("  {:10} {:>8}", month.month.to_string(), month.order_count);
    }
}
