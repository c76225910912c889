//! # Seed Data Generator
//!
//! Populates a database with a demo stationery shop.
//!
//! ## Usage
//! ```bash
//! # Seed 60 products (default)
//! cargo run -p akari-db --bin seed
//!
//! # Custom amount
//! cargo run -p akari-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p akari-db --bin seed -- --db ./data/akari.db
//! ```
//!
//! ## Generated Data
//! - Categories and providers per department
//! - Products with SKU `{DEPT}-{ABC}-{NNN}`, colour variants, and stock 0..=60
//! - A stock alert on every tenth product
//! - Two users (`admin`, `caja1`), three clients
//! - Promo codes: an active one, an expired one, an inactive one

use chrono::{Duration, Utc};
use serde_json::json;
use std::env;

use akari_core::{NewProduct, NewPromoCode, NewUser, UserType};
use akari_db::{Database, DbConfig};

/// Departments: (code, category name, provider, products)
const DEPARTMENTS: &[(&str, &str, &str, &[&str])] = &[
    (
        "PAP",
        "Papelería",
        "Distribuidora Norte",
        &[
            "Cuaderno Profesional",
            "Cuaderno Italiano",
            "Block de Notas",
            "Carpeta Argollas",
            "Folder Carta",
            "Sobre Manila",
            "Hojas Blancas",
            "Etiquetas Adhesivas",
        ],
    ),
    (
        "ESC",
        "Escritura",
        "Tintas del Valle",
        &[
            "Pluma Gel",
            "Bolígrafo",
            "Lápiz HB",
            "Marcatextos",
            "Plumón Permanente",
            "Portaminas",
            "Corrector",
        ],
    ),
    (
        "ART",
        "Arte",
        "Casa del Artista",
        &[
            "Acuarelas",
            "Pincel Redondo",
            "Lienzo",
            "Colores de Madera",
            "Pastel Seco",
            "Cartulina",
        ],
    ),
];

const COLORS: &[&str] = &["Negro", "Azul", "Rojo", "Verde"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./akari_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Akari POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./akari_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Akari POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list(None).await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut alerts = 0;

    'departments: for (dept_idx, (code, category_name, provider_name, names)) in
        DEPARTMENTS.iter().enumerate()
    {
        let category = db.categories().create(category_name, None).await?;
        let provider = db
            .providers()
            .create(provider_name, None, Some("ventas@example.com"))
            .await?;

        for (name_idx, name) in names.iter().enumerate() {
            for (color_idx, color) in COLORS.iter().enumerate() {
                if generated >= count {
                    break 'departments;
                }

                let seed = dept_idx * 1000 + name_idx * 10 + color_idx;
                let input = generate_product(code, name, color, &provider.id, seed);

                let product = match db.products().create(&input).await {
                    Ok(product) => product,
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", input.name, e);
                        continue;
                    }
                };
                db.categories().link_product(&product.id, &category.id).await?;

                if generated % 10 == 0 {
                    db.stock_alerts().create(&product.id, 5).await?;
                    alerts += 1;
                }
                generated += 1;
            }
        }
    }

    let mut users = 0;
    for (username, user_type) in [("admin", UserType::Admin), ("caja1", UserType::Vendedor)] {
        db.users()
            .register(&NewUser {
                username: username.to_string(),
                phone: None,
                user_type,
            })
            .await?;
        users += 1;
    }

    let mut clients = 0;
    for (name, address) in [
        ("Público General", None),
        ("Colegio Reforma", Some("Calle 5 de Mayo 40")),
        ("Despacho Ortega", Some("Av. Hidalgo 118")),
    ] {
        db.clients().create(name, address, None).await?;
        clients += 1;
    }

    let today = Utc::now().date_naive();
    let promos = [
        ("SUMMER10", 1000, Some(today + Duration::days(90)), true),
        ("VUELTA15", 1500, Some(today - Duration::days(30)), true),
        ("STAFF50", 5000, None, false),
    ];
    for (code, discount_bps, expires_on, is_active) in promos {
        db.promo_codes()
            .create(&NewPromoCode {
                code: code.to_string(),
                discount_bps,
                expires_on,
                is_active,
            })
            .await?;
    }

    let summary = json!({
        "products": generated,
        "categories": DEPARTMENTS.len(),
        "stock_alerts": alerts,
        "users": users,
        "clients": clients,
        "promo_codes": promos.len(),
        "low_stock": db.stock_alerts().low_stock().await?.len(),
        "elapsed_ms": start.elapsed().as_millis() as u64,
    });

    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Builds a single product with deterministic pseudo-random data.
fn generate_product(
    dept: &str,
    name: &str,
    color: &str,
    provider_id: &str,
    seed: usize,
) -> NewProduct {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:03}", dept, prefix, seed % 1000);

    // $5.00 - $149.99
    let price_sell_cents = 500 + ((seed * 37) % 14_500) as i64;
    // Cost 55-75% of price
    let price_buy_cents = price_sell_cents * (55 + (seed % 20) as i64) / 100;

    NewProduct {
        name: format!("{} {}", name, color),
        sku: Some(sku),
        color: Some(color.to_string()),
        quantity: (seed % 61) as i64,
        price_sell_cents,
        price_buy_cents,
        provider_id: Some(provider_id.to_string()),
        image_url: None,
    }
}
