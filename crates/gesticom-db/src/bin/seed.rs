//! # Seed Data Generator
//!
//! Populates a GestiCom database for development.
//!
//! ## Usage
//! ```bash
//! # 200 products (default) in ./gesticom.db
//! cargo run -p gesticom-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p gesticom-db --bin seed -- --db ./data/gesticom.db --count 1000
//! ```
//!
//! Creates one admin user (`admin@gesticom.cl`) and sample products with
//! codes `{CATEGORY}-{INDEX}`. Running it again skips codes and users that
//! already exist.

use std::env;

use anyhow::Context;
use gesticom_core::{ProductInput, Role, UserInput};
use gesticom_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNT: usize = 200;
const DEFAULT_DB: &str = "./gesticom.db";

const ADMIN_EMAIL: &str = "admin@gesticom.cl";
const ADMIN_NATIONAL_ID: &str = "11.111.111-1";

/// Category code, category name, supplier and base names.
const CATEGORIES: &[(&str, &str, &str, &[&str])] = &[
    (
        "ABA",
        "Abarrotes",
        "Distribuidora Central",
        &["Arroz", "Fideos", "Azúcar", "Harina", "Aceite", "Sal", "Lentejas", "Porotos"],
    ),
    (
        "BEB",
        "Bebidas",
        "Embotelladora Sur",
        &["Agua mineral", "Bebida cola", "Jugo naranja", "Té helado", "Bebida limón"],
    ),
    (
        "LAC",
        "Lácteos",
        "Lechería del Valle",
        &["Leche entera", "Yogur natural", "Queso gauda", "Mantequilla", "Leche descremada"],
    ),
    (
        "LIM",
        "Limpieza",
        "Higiene Total",
        &["Detergente", "Lavaloza", "Cloro", "Limpiavidrios", "Esponja"],
    ),
    (
        "PAN",
        "Panadería",
        "Panificadora Norte",
        &["Pan molde", "Galletas", "Queque", "Tostadas"],
    ),
];

const SIZES: &[(&str, i64)] = &[("chico", 0), ("mediano", 400), ("grande", 900), ("familiar", 1500)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut db_path = String::from(DEFAULT_DB);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                let value = args.get(i + 1).context("--count needs a value")?;
                count = value
                    .parse()
                    .with_context(|| format!("invalid --count value: {value}"))?;
                i += 1;
            }
            "--db" | "-d" => {
                db_path = args.get(i + 1).context("--db needs a value")?.clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("GestiCom seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: {DEFAULT_COUNT})");
                println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_DB})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    seed_admin(&db).await?;

    let mut created = 0usize;
    let mut skipped = 0usize;

    'outer: for (category_code, category, supplier, names) in CATEGORIES {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, price_addon)) in SIZES.iter().enumerate() {
                if created + skipped >= count {
                    break 'outer;
                }

                let index = name_idx * SIZES.len() + size_idx;
                let input = sample_product(category_code, category, supplier, name, size, *price_addon, index);

                if db.products().get_by_code(&input.code).await?.is_some() {
                    skipped += 1;
                    continue;
                }

                db.products()
                    .insert(&input)
                    .await
                    .with_context(|| format!("inserting {}", input.code))?;
                created += 1;
            }
        }
    }

    let total = db.products().count().await?;
    info!(created, skipped, total, "Seed complete");

    db.close().await;
    Ok(())
}

async fn seed_admin(db: &Database) -> anyhow::Result<()> {
    if db.users().get_by_email(ADMIN_EMAIL).await?.is_some() {
        info!(email = ADMIN_EMAIL, "Admin user already present");
        return Ok(());
    }

    let admin = db
        .users()
        .create(&UserInput {
            name: "Administrador".to_string(),
            national_id: ADMIN_NATIONAL_ID.to_string(),
            email: ADMIN_EMAIL.to_string(),
            role: Some(Role::Admin),
        })
        .await
        .context("creating admin user")?;

    info!(id = %admin.id, email = %admin.email, "Admin user created");
    Ok(())
}

fn sample_product(
    category_code: &str,
    category: &str,
    supplier: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    index: usize,
) -> ProductInput {
    let base_price = 490 + ((index * 137) % 2500) as i64;

    ProductInput {
        code: format!("{category_code}-{index:03}"),
        name: format!("{name} {size}"),
        description: None,
        unit_price_cents: base_price + price_addon,
        // Spread across every stock level, out of stock included
        stock_quantity: ((index * 7) % 41) as i64,
        category: Some(category.to_string()),
        supplier: Some(supplier.to_string()),
    }
}
