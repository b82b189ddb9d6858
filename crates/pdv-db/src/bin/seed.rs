//! # Seed Data Generator
//!
//! Creates the first administrator and a starter catalog.
//!
//! ## Usage
//! ```bash
//! # Default database, admin@pdv.local / admin123
//! cargo run -p pdv-db --bin seed
//!
//! # Custom database and admin
//! cargo run -p pdv-db --bin seed -- --db ./data/pdv.db --email dono@loja.com --password s3nh4forte
//! ```
//!
//! `PDV_ADMIN_EMAIL` and `PDV_ADMIN_PASSWORD` are used when the flags are
//! absent. Public registration only creates `user` accounts, so this is
//! the way to get the first admin.
//!
//! ## Generated Catalog
//! Categories with a handful of products each. Barcodes are `789` plus the
//! product index (13 digits, checksum not valid). A few products start at
//! or below their minimum stock so the dashboard has something to show.

use std::env;

use anyhow::{bail, Context};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use pdv_core::validation::{validate_email, validate_password};
use pdv_core::{NewProduct, Role};
use pdv_db::{Database, DbConfig, NewUser};

const DEFAULT_DB_PATH: &str = "./pdv.db";
const DEFAULT_ADMIN_EMAIL: &str = "admin@pdv.local";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// (category, [(name, price_cents, stock, min_stock)])
const CATALOG: &[(&str, &[(&str, i64, i64, i64)])] = &[
    (
        "Bebidas",
        &[
            ("Refrigerante Cola 2L", 999, 48, 10),
            ("Água Mineral 500ml", 250, 120, 24),
            ("Suco de Laranja 1L", 789, 20, 6),
            ("Cerveja Lata 350ml", 459, 5, 12),
        ],
    ),
    (
        "Mercearia",
        &[
            ("Arroz Branco 5kg", 2890, 30, 5),
            ("Feijão Carioca 1kg", 849, 40, 8),
            ("Café Torrado 500g", 1890, 3, 5),
            ("Açúcar Refinado 1kg", 499, 60, 10),
            ("Óleo de Soja 900ml", 799, 25, 6),
        ],
    ),
    (
        "Padaria",
        &[
            ("Pão Francês (un)", 75, 200, 50),
            ("Pão de Queijo (un)", 150, 80, 20),
            ("Bolo de Fubá", 1200, 2, 2),
        ],
    ),
    (
        "Higiene",
        &[
            ("Sabonete 90g", 299, 70, 10),
            ("Creme Dental 90g", 549, 0, 8),
            ("Papel Higiênico 12un", 2190, 15, 4),
        ],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,pdv_db=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("PDV_DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let mut email = env::var("PDV_ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let mut password =
        env::var("PDV_ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match (args[i].as_str(), value) {
            ("--db" | "-d", Some(v)) => {
                db_path = v;
                i += 1;
            }
            ("--email" | "-e", Some(v)) => {
                email = v;
                i += 1;
            }
            ("--password" | "-p", Some(v)) => {
                password = v;
                i += 1;
            }
            ("--help" | "-h", _) => {
                println!("PDV Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: {DEFAULT_DB_PATH})");
                println!("  -e, --email <EMAIL>      Admin email (default: {DEFAULT_ADMIN_EMAIL})");
                println!("  -p, --password <PASS>    Admin password (default: {DEFAULT_ADMIN_PASSWORD})");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            (flag, None) if flag.starts_with('-') => bail!("missing value for {flag}"),
            _ => {}
        }
        i += 1;
    }

    let email = validate_email(&email).context("invalid admin email")?;
    validate_password(&password).context("invalid admin password")?;

    println!("🌱 PDV Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Admin
    if db.users().get_by_email(&email).await?.is_some() {
        println!("⚠ User {} already exists, leaving it untouched", email);
    } else {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
            .to_string();

        let admin = db
            .users()
            .insert(NewUser {
                name: "Administrador".to_string(),
                email: email.clone(),
                phone: None,
                password_hash,
                role: Role::Admin,
            })
            .await?;
        println!("✓ Admin created: {} ({})", admin.email, admin.id);
    }

    // Catalog
    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalog to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0usize;
    for (category, products) in CATALOG {
        for (name, price_cents, stock, min_stock) in products.iter() {
            let product = NewProduct {
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                cost_price_cents: price_cents * 6 / 10,
                stock_quantity: *stock,
                min_stock: *min_stock,
                barcode: Some(format!("789{:010}", generated + 1)),
                category: Some(category.to_string()),
            };

            match db.products().insert(product).await {
                Ok(p) => {
                    generated += 1;
                    println!(
                        "  {} {:<28} {}",
                        p.internal_code().unwrap_or_default(),
                        p.name,
                        p.price()
                    );
                }
                Err(e) => eprintln!("Failed to insert {}: {}", name, e),
            }
        }
    }

    let low_stock = db.products().count_low_stock().await?;

    println!();
    println!("✓ Generated {} products ({} low on stock)", generated, low_stock);
    println!("✓ Seed complete!");

    Ok(())
}
