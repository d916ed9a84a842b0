//! # Seed Data Generator
//!
//! Populates an empty data directory with a starter catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured data directory
//! cargo run -p stockroom-store --bin seed
//!
//! # Seed a specific directory
//! cargo run -p stockroom-store --bin seed -- --data-dir ./data
//!
//! # Pick the admin password
//! cargo run -p stockroom-store --bin seed -- --admin-password s3cret
//! ```
//!
//! ## Seeded Records
//! Each collection is only seeded when it is empty:
//! - Products: Notebook (120.00, 50 in stock), Pen (15.00, 200 in stock)
//! - Customers: Rahim, Karim
//! - Employees: `admin` with role Admin

use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stockroom_core::validation::{validate_name, validate_product};
use stockroom_core::{Customer, Money, Product};
use stockroom_store::{auth, Database, StoreConfig};

/// Starter catalog: (name, price in cents, stock).
const PRODUCTS: &[(&str, i64, i64)] = &[("Notebook", 12000, 50), ("Pen", 1500, 200)];

/// Starter customers: (name, phone, email).
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Rahim", "01711111111", "rahim@example.com"),
    ("Karim", "01822222222", "karim@example.com"),
];

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut data_dir: Option<PathBuf> = None;
    let mut admin_password = String::from(DEFAULT_ADMIN_PASSWORD);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --data-dir <PATH>         Data directory (default: from stockroom.toml)");
                println!("  -p, --admin-password <PASS>   Password for the admin login (default: admin123)");
                println!("  -h, --help                    Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = StoreConfig::load_or_default(None);
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Data directory: {}", config.data_dir.display());
    println!();

    let db = Database::open(config)?;

    // Products
    let products = db.products();
    if products.count()? > 0 {
        println!("⚠ Products already present, skipping");
    } else {
        for &(name, cents, stock) in PRODUCTS {
            let product = Product::new(name, Money::from_cents(cents), stock);
            validate_product(&product)?;
            let stored = products.add(product)?;
            info!(id = stored.id, name, price = %stored.price, stock, "Seeded product");
        }
        println!("✓ Seeded {} products", PRODUCTS.len());
    }

    // Customers
    let customers = db.customers();
    if customers.count()? > 0 {
        println!("⚠ Customers already present, skipping");
    } else {
        for &(name, phone, email) in CUSTOMERS {
            validate_name("name", name)?;
            let stored = customers.add(Customer::new(name, phone, email))?;
            info!(id = stored.id, name, "Seeded customer");
        }
        println!("✓ Seeded {} customers", CUSTOMERS.len());
    }

    // Employees
    match auth::bootstrap_admin(&db.employees(), "admin", &admin_password)? {
        Some(admin) => println!("✓ Created admin login (id {})", admin.id),
        None => println!("⚠ Employees already present, skipping"),
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
