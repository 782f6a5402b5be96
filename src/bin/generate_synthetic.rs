//! Synthetic data generator for the order dashboard
//!
//! Writes a line-item order CSV with the columns the dashboard reads, so the
//! report and API can be exercised without the real export.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --orders <N>            Number of distinct orders (default: 5000)
//!   --customers <N>         Number of distinct customers (default: 3000)
//!   --start <DATE>          First purchase day (default: 2017-01-01)
//!   --days <N>              Purchase window in days (default: 365)
//!   --late-rate <F>         Share of delivered orders arriving late (default: 0.08)
//!   --undelivered-rate <F>  Share of orders never delivered (default: 0.03)
//!   --seed <N>              Random seed for reproducibility (optional)
//!   --output <PATH>         Output CSV path (default: data/main_data.csv)

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::PathBuf;

/// Synthetic data generator for the order dataset
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate synthetic e-commerce order data")]
struct Args {
    /// Number of distinct orders
    #[arg(long, default_value = "5000")]
    orders: usize,

    /// Number of distinct customers
    #[arg(long, default_value = "3000")]
    customers: usize,

    /// First purchase day (YYYY-MM-DD)
    #[arg(long, default_value = "2017-01-01")]
    start: NaiveDate,

    /// Length of the purchase window in days
    #[arg(long, default_value = "365")]
    days: i64,

    /// Maximum line items per order
    #[arg(long, default_value = "3")]
    max_items: usize,

    /// Probability that a delivered order arrives after its estimate
    #[arg(long, default_value = "0.08")]
    late_rate: f64,

    /// Probability that an order has no delivery date
    #[arg(long, default_value = "0.03")]
    undelivered_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = "data/main_data.csv")]
    output: PathBuf,
}

/// Cities with their state, weighted roughly by order volume
const CITIES: &[(&str, &str, u32)] = &[
    ("sao paulo", "SP", 30),
    ("rio de janeiro", "RJ", 14),
    ("belo horizonte", "MG", 6),
    ("brasilia", "DF", 4),
    ("curitiba", "PR", 3),
    ("campinas", "SP", 3),
    ("porto alegre", "RS", 3),
    ("salvador", "BA", 3),
    ("guarulhos", "SP", 2),
    ("niteroi", "RJ", 2),
    ("santos", "SP", 2),
    ("fortaleza", "CE", 2),
    ("recife", "PE", 2),
    ("goiania", "GO", 2),
    ("florianopolis", "SC", 1),
    ("manaus", "AM", 1),
    ("belem", "PA", 1),
    ("natal", "RN", 1),
    ("vitoria", "ES", 1),
    ("sao luis", "MA", 1),
];

/// Output row, one per line item
#[derive(Debug, Serialize)]
struct OutputRecord {
    order_id: String,
    customer_unique_id: String,
    customer_city: String,
    customer_state: String,
    order_item_id: usize,
    order_purchase_timestamp: String,
    order_delivered_customer_date: String,
    order_estimated_delivery_date: String,
}

struct Customer {
    id: String,
    city: &'static str,
    state: &'static str,
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 32 hex chars, like the export's hashed identifiers
fn generate_id(rng: &mut impl Rng) -> String {
    format!("{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>())
}

fn generate_customers(count: usize, rng: &mut impl Rng) -> Vec<Customer> {
    (0..count)
        .map(|_| {
            let (city, state, _) = CITIES
                .choose_weighted(rng, |c| c.2)
                .copied()
                .unwrap_or(CITIES[0]);
            Customer {
                id: generate_id(rng),
                city,
                state,
            }
        })
        .collect()
}

/// Purchase, delivery and estimate for one order
fn generate_timeline(
    args: &Args,
    rng: &mut impl Rng,
) -> Option<(NaiveDateTime, Option<NaiveDateTime>, NaiveDateTime)> {
    let day = args.start + Duration::days(rng.gen_range(0..args.days.max(1)));
    let purchase = day.and_hms_opt(rng.gen_range(0..24), rng.gen_range(0..60), rng.gen_range(0..60))?;

    // Estimates are quoted as whole days at midnight
    let estimated = (day + Duration::days(rng.gen_range(10..=30))).and_hms_opt(0, 0, 0)?;

    let delivered = if rng.gen_bool(args.undelivered_rate.clamp(0.0, 1.0)) {
        None
    } else if rng.gen_bool(args.late_rate.clamp(0.0, 1.0)) {
        Some(estimated + Duration::days(rng.gen_range(1..=20)) + Duration::hours(rng.gen_range(0..24)))
    } else {
        let lead = (estimated - purchase).num_hours().max(1);
        Some(purchase + Duration::hours(rng.gen_range(1..=lead)))
    };

    Some((purchase, delivered, estimated))
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("🔧 Synthetic Order Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Output:            {}", args.output.display());
    println!("Orders:            {}", args.orders);
    println!("Customers:         {}", args.customers);
    println!("Window:            {} + {} days", args.start, args.days);
    println!("Late rate:         {:.1}%", args.late_rate * 100.0);
    println!("Undelivered rate:  {:.1}%", args.undelivered_rate * 100.0);
    if let Some(seed) = args.seed {
        println!("Random seed:       {}", seed);
    }
    println!();

    // Initialize RNG
    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    // Ensure output directory exists
    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let customers = generate_customers(args.customers.max(1), &mut rng);

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    println!("🏭 Generating orders...");
    let mut rows_written = 0;
    let mut undelivered = 0;

    for i in 0..args.orders {
        let Some((purchase, delivered, estimated)) = generate_timeline(&args, &mut rng) else {
            continue;
        };
        if delivered.is_none() {
            undelivered += 1;
        }

        let customer = &customers[rng.gen_range(0..customers.len())];
        let order_id = generate_id(&mut rng);
        let items = rng.gen_range(1..=args.max_items.max(1));

        for item in 1..=items {
            writer.serialize(OutputRecord {
                order_id: order_id.clone(),
                customer_unique_id: customer.id.clone(),
                customer_city: customer.city.to_string(),
                customer_state: customer.state.to_string(),
                order_item_id: item,
                order_purchase_timestamp: format_datetime(&purchase),
                order_delivered_customer_date: delivered.as_ref().map(format_datetime).unwrap_or_default(),
                order_estimated_delivery_date: format_datetime(&estimated),
            })?;
            rows_written += 1;
        }

        // Progress indicator
        if (i + 1) % 10000 == 0 {
            println!("   Generated {}/{} orders...", i + 1, args.orders);
        }
    }

    writer.flush()?;

    println!("\n✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Orders:            {:>8}", args.orders);
    println!("Line items:        {:>8}", rows_written);
    println!("Undelivered:       {:>8}", undelivered);
    println!("Output file:       {}", args.output.display());

    Ok(())
}
