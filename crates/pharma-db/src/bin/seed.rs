//! # Seed Data Generator
//!
//! Populates the database with demo catalog and batch data for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p pharma-db --bin seed
//!
//! # Specify database path
//! cargo run -p pharma-db --bin seed -- --db ./data/pharma.db
//! ```
//!
//! Each product gets 2-3 stock batches with staggered expiry dates so FEFO
//! allocation is visible immediately in a dev build.

use chrono::{Duration, Utc};
use std::env;

use pharma_core::{new_id, Product, StockBatch};
use pharma_db::{Database, DbConfig};

/// Demo catalog: (name, salt formula, barcode suffix, selling price cents)
const CATALOG: &[(&str, &str, u32, i64)] = &[
    ("Panadol 500mg Tablets", "Paracetamol 500mg", 1001, 250),
    ("Panadol Extra Tablets", "Paracetamol 500mg + Caffeine 65mg", 1002, 380),
    ("Brufen 400mg Tablets", "Ibuprofen 400mg", 1003, 420),
    ("Augmentin 625mg Tablets", "Amoxicillin 500mg + Clavulanic Acid 125mg", 1004, 3250),
    ("Flagyl 400mg Tablets", "Metronidazole 400mg", 1005, 180),
    ("Risek 20mg Capsules", "Omeprazole 20mg", 1006, 1650),
    ("Ventolin Inhaler", "Salbutamol 100mcg", 1007, 2890),
    ("Zyrtec 10mg Tablets", "Cetirizine 10mg", 1008, 540),
    ("Calpol Syrup 120ml", "Paracetamol 120mg/5ml", 1009, 950),
    ("Amoxil 500mg Capsules", "Amoxicillin 500mg", 1010, 1480),
    ("Disprin Tablets", "Aspirin 300mg", 1011, 120),
    ("Glucophage 500mg Tablets", "Metformin 500mg", 1012, 760),
];

/// Expiry spread for the batches of each product, in days from today.
const EXPIRY_OFFSETS_DAYS: &[i64] = &[90, 240, 540];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./pharma_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pharma POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./pharma_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Pharma POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products", existing);
        println!("Skipping seed to avoid duplicates. Delete the file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let today = now.date_naive();
    let mut product_count = 0;
    let mut batch_count = 0;

    for (index, (name, salt, barcode_suffix, price_cents)) in CATALOG.iter().enumerate() {
        let product = Product {
            id: new_id(),
            name: name.to_string(),
            barcode: Some(format!("896000{:07}", barcode_suffix)),
            salt_formula: Some(salt.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
        product_count += 1;

        // 2-3 batches per product, earliest expiry first in the numbering
        let batches = 2 + (index % 2);
        for (batch_index, offset) in EXPIRY_OFFSETS_DAYS.iter().take(batches).enumerate() {
            let batch = StockBatch {
                id: new_id(),
                product_id: product.id.clone(),
                batch_number: format!("BN{:04}-{}", index + 1, batch_index + 1),
                quantity: 20 + ((index * 7 + batch_index * 13) % 80) as i64,
                cost_price_cents: price_cents * 70 / 100,
                selling_price_cents: *price_cents,
                expiry_date: today + Duration::days(*offset),
                purchase_date: today - Duration::days(30),
                created_at: now,
                updated_at: now,
            };
            db.batches().insert(&batch).await?;
            batch_count += 1;
        }
    }

    println!();
    println!("Seeded {} products, {} batches", product_count, batch_count);

    // Verify search and the FEFO read path
    let hits = db.products().search("paracetamol", 10).await?;
    println!("Search 'paracetamol': {} results", hits.len());

    if let Some(first) = hits.first() {
        let available = db.batches().available_for_product(&first.id).await?;
        println!(
            "'{}' has {} batches, earliest expiry {}",
            first.name,
            available.len(),
            available
                .first()
                .map(|b| b.expiry_date.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    println!();
    println!("Seed complete");

    Ok(())
}
