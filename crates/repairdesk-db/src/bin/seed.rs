//! # Seed Data Generator
//!
//! Populates a database with a demo catalog, supplier purchases and jobs in
//! every stage of the lifecycle.
//!
//! ## Usage
//! ```bash
//! # Database from shop.toml / REPAIRDESK_DB_PATH
//! cargo run -p repairdesk-db --bin seed
//!
//! # Explicit database file
//! cargo run -p repairdesk-db --bin seed -- --db ./repairdesk_dev.db
//!
//! # Explicit config file
//! cargo run -p repairdesk-db --bin seed -- --config ./shop.toml
//! ```

use std::env;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use repairdesk_core::{
    ContactRef, FinalizeInvoice, Money, NewProduct, NewPurchase, NewServiceRecord, ProductKind,
    ServiceRecordPatch, UsedItemLine, WarrantySnapshot, WorkStatus,
};
use repairdesk_db::{Database, ShopConfig};

/// (name, kind, cost, sale, opening stock, warranty, tags)
const CATALOG: &[(&str, ProductKind, i64, i64, i64, bool, &[&str])] = &[
    ("Screen iPhone 13", ProductKind::Product, 4500, 12000, 4, true, &["screen", "apple"]),
    ("Screen Galaxy S21", ProductKind::Product, 5200, 13500, 2, true, &["screen", "samsung"]),
    ("Battery iPhone 13", ProductKind::Product, 1500, 4500, 6, true, &["battery", "apple"]),
    ("Charging Port USB-C", ProductKind::Product, 400, 2500, 10, false, &["port"]),
    ("Back Glass iPhone 13", ProductKind::Product, 900, 6000, 3, false, &["glass", "apple"]),
    ("Diagnostics", ProductKind::Service, 0, 2000, 0, false, &["labor"]),
    ("Water Damage Cleaning", ProductKind::Service, 0, 5000, 0, false, &["labor"]),
    ("Data Backup", ProductKind::Service, 0, 3000, 0, false, &["labor"]),
];

/// (customer, phone, device, fault)
const JOBS: &[(&str, &str, &str, &str)] = &[
    ("John Doe", "555-0101", "iPhone 13", "Cracked screen"),
    ("Jane Roe", "555-0102", "iPhone 13", "Battery drains fast"),
    ("Ali Khan", "555-0103", "Galaxy S21", "Display flickers"),
    ("Maria Silva", "555-0104", "Pixel 6", "Does not charge"),
    ("Wei Chen", "555-0105", "iPhone 13", "Dropped in water"),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,repairdesk=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RepairDesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  shop.toml to load");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = ShopConfig::load(config_path)?;
    if db_path.is_some() {
        config.database.path = db_path;
    }

    let db = Database::from_config(&config).await?;
    info!(shop = %config.shop.name, "Connected, migrations applied");

    let existing = db.products().list().await?;
    if !existing.is_empty() {
        println!("Database already has {} catalog entries", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let mut catalog = Vec::with_capacity(CATALOG.len());
    for (name, kind, cost, sale, stock, warranty, tags) in CATALOG {
        let product = db
            .products()
            .insert(NewProduct {
                name: name.to_string(),
                kind: *kind,
                cost_price_cents: *cost,
                sale_price_cents: *sale,
                opening_stock: *stock,
                has_warranty: *warranty,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .await?;
        catalog.push(product);
    }
    println!("Added {} catalog entries", catalog.len());

    // Purchases: restock every physical part once.
    let today = Utc::now().date_naive();
    let mut purchases = 0;
    for (offset, product) in catalog.iter().filter(|p| p.kind.tracks_stock()).enumerate() {
        db.purchases()
            .add_purchase(NewPurchase {
                date: today - Duration::days(offset as i64 + 1),
                supplier_id: "supplier-001".to_string(),
                supplier_name: "Mobile Parts Wholesale".to_string(),
                product_id: product.id.clone(),
                quantity: 5,
                unit_price_cents: product.cost_price_cents,
                notes: None,
            })
            .await?;
        purchases += 1;
    }
    println!("Recorded {} purchases", purchases);

    // Jobs
    let find = |name: &str| {
        catalog
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
            .ok_or_else(|| format!("missing seed product {name}"))
    };
    let warranty = WarrantySnapshot {
        id: "warranty-90d".to_string(),
        name: "90-day parts and labor".to_string(),
        duration_months: 3,
    };

    let mut jobs = Vec::with_capacity(JOBS.len());
    for (idx, (customer, phone, device, fault)) in JOBS.iter().enumerate() {
        let job = db
            .settlement()
            .create_record(NewServiceRecord {
                contact: ContactRef {
                    id: format!("contact-{:03}", idx + 1),
                    name: customer.to_string(),
                    phone: phone.to_string(),
                },
                device_description: device.to_string(),
                fault_description: fault.to_string(),
                estimated_labor_cents: 5000,
                employee: "seed".to_string(),
            })
            .await?;
        jobs.push(job);
    }

    let settlement = db.settlement();
    let being_repaired = ServiceRecordPatch {
        work_status: Some(WorkStatus::BeingRepaired),
        ..Default::default()
    };

    // John: delivered with a new screen.
    settlement
        .finalize_invoice(
            &jobs[0].id,
            FinalizeInvoice {
                final_labor_cents: 6000,
                used_items: vec![
                    UsedItemLine::new(find("Screen iPhone 13")?, 1),
                    UsedItemLine::new(find("Diagnostics")?, 1),
                ],
                warranty: Some(warranty.clone()),
            },
        )
        .await?;

    // Jane: delivered with a battery.
    settlement
        .finalize_invoice(
            &jobs[1].id,
            FinalizeInvoice {
                final_labor_cents: 3000,
                used_items: vec![UsedItemLine::new(find("Battery iPhone 13")?, 1)],
                warranty: Some(warranty),
            },
        )
        .await?;

    // Ali: on the bench with a screen reserved.
    settlement
        .update_record(
            &jobs[2].id,
            ServiceRecordPatch {
                used_items: Some(vec![UsedItemLine::new(find("Screen Galaxy S21")?, 1)]),
                ..being_repaired.clone()
            },
        )
        .await?;

    // Maria: waiting in the queue (no change).

    // Wei: customer refused the water damage quote.
    settlement
        .update_record(&jobs[4].id, being_repaired)
        .await?;
    settlement
        .update_record(
            &jobs[4].id,
            ServiceRecordPatch {
                work_status: Some(WorkStatus::CustomerRefused),
                ..Default::default()
            },
        )
        .await?;

    println!("Opened {} jobs", jobs.len());

    let sales = db.records().list_invoiced("").await?;
    let revenue: Money = sales
        .iter()
        .filter_map(|r| r.final_total_cents)
        .map(Money::from_cents)
        .sum();
    let parts_cost: Money = sales.iter().map(|r| r.parts_cost()).sum();
    println!(
        "Sales history: {} invoices, {} total, {} parts cost, {} gross profit",
        sales.len(),
        revenue,
        parts_cost,
        revenue - parts_cost
    );

    db.close().await;
    Ok(())
}
