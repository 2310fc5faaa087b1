//! # Seed Data Generator
//!
//! Populates a development database with a small clothing catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom_dev.db with 3 batches per product (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Admit the first N units of every batch as well
//! cargo run -p stockroom-db --bin seed -- --admit 2
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - Custom fields: Color (select), Size (select), Material (text)
//! - Category tree: Clothing > Tops / Bottoms, Accessories
//! - One warehouse and one retail store
//! - A product per catalog entry, each with batches of 3-12 units

use std::collections::BTreeMap;
use std::env;

use serde_json::json;
use stockroom_core::{FieldType, StoreType};
use stockroom_db::{
    Database, DbConfig, NewBatch, NewCategory, NewField, NewProduct, NewStore,
};

/// (category, name, color, size, material, price in cents)
const CATALOG: &[(&str, &str, &str, &str, &str, i64)] = &[
    ("Tops", "Linen Shirt", "White", "M", "Linen", 4500),
    ("Tops", "Oxford Shirt", "Blue", "L", "Cotton", 5200),
    ("Tops", "Merino Sweater", "Grey", "M", "Wool", 8900),
    ("Tops", "Graphic Tee", "Black", "S", "Cotton", 2400),
    ("Bottoms", "Chino Trousers", "Beige", "L", "Cotton", 5900),
    ("Bottoms", "Selvedge Jeans", "Blue", "M", "Denim", 9800),
    ("Bottoms", "Running Shorts", "Black", "S", "Polyester", 2900),
    ("Accessories", "Leather Belt", "Brown", "M", "Leather", 3500),
    ("Accessories", "Wool Beanie", "Grey", "S", "Wool", 1900),
    ("Accessories", "Canvas Tote", "Beige", "L", "Canvas", 2200),
];

const COLORS: &[&str] = &["White", "Black", "Blue", "Grey", "Beige", "Brown"];
const SIZES: &[&str] = &["S", "M", "L"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut batches_per_product: usize = 3;
    let mut admit: i64 = 0;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--batches" | "-b" => {
                if i + 1 < args.len() {
                    batches_per_product = args[i + 1].parse().unwrap_or(3);
                    i += 1;
                }
            }
            "--admit" | "-a" => {
                if i + 1 < args.len() {
                    admit = args[i + 1].parse().unwrap_or(0);
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
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --batches <N>  Batches per product (default: 3)");
                println!("  -a, --admit <N>    Units to admit per batch (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Batches per product: {}", batches_per_product);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Fields
    db.fields()
        .create(NewField {
            name: "Color".to_string(),
            field_type: FieldType::Select,
            options: COLORS.iter().map(|c| c.to_string()).collect(),
            required: true,
        })
        .await?;
    db.fields()
        .create(NewField {
            name: "Size".to_string(),
            field_type: FieldType::Select,
            options: SIZES.iter().map(|s| s.to_string()).collect(),
            required: true,
        })
        .await?;
    db.fields()
        .create(NewField {
            name: "Material".to_string(),
            field_type: FieldType::Text,
            options: Vec::new(),
            required: false,
        })
        .await?;
    println!("✓ Created 3 custom fields");

    // Categories
    let clothing = db
        .categories()
        .create(NewCategory {
            name: "Clothing".to_string(),
            parent_id: None,
            sort_order: 0,
        })
        .await?;
    let mut category_ids = BTreeMap::new();
    for (order, (name, parent)) in [
        ("Tops", Some(clothing.id.clone())),
        ("Bottoms", Some(clothing.id.clone())),
        ("Accessories", None),
    ]
    .into_iter()
    .enumerate()
    {
        let category = db
            .categories()
            .create(NewCategory {
                name: name.to_string(),
                parent_id: parent,
                sort_order: order as i64,
            })
            .await?;
        category_ids.insert(name, category.id);
    }
    println!("✓ Created {} categories", category_ids.len() + 1);

    // Stores
    db.stores()
        .create(NewStore {
            name: "Central Warehouse".to_string(),
            store_type: StoreType::Warehouse,
            address: Some("Unit 4, Dock Road".to_string()),
        })
        .await?;
    db.stores()
        .create(NewStore {
            name: "High Street".to_string(),
            store_type: StoreType::Retail,
            address: Some("12 High Street".to_string()),
        })
        .await?;
    println!("✓ Created 2 stores");

    println!();
    println!("Generating products and batches...");

    let start = std::time::Instant::now();
    let mut batches = 0;
    let mut admitted = 0;

    for (idx, (category, name, color, size, material, price)) in CATALOG.iter().enumerate() {
        let mut attributes = BTreeMap::new();
        attributes.insert("Color".to_string(), json!(color));
        attributes.insert("Size".to_string(), json!(size));
        attributes.insert("Material".to_string(), json!(material));

        let product = match db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                sku: Some(format!("SKU-{:04}", idx + 1)),
                description: None,
                category_id: category_ids.get(category).cloned(),
                selling_price_cents: *price,
                attributes,
            })
            .await
        {
            Ok(product) => product,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
        };

        for b in 0..batches_per_product {
            let quantity = 3 + ((idx * 7 + b * 5) % 10) as i64;
            let batch = db
                .batches()
                .create(NewBatch {
                    product_id: product.id.clone(),
                    cost_price_cents: price * 45 / 100,
                    selling_price_cents: *price,
                    quantity,
                })
                .await?;
            batches += 1;

            for _ in 0..admit.min(quantity) {
                let status = db.admission().status(&batch.id).await?;
                let Some(code) = status.expected_code else {
                    break;
                };
                db.admission().submit(&batch.id, &code).await?;
                admitted += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} products, {} batches, {} admitted units in {:?}",
        CATALOG.len(),
        batches,
        admitted,
        elapsed
    );

    let search_results = db.products().search("shirt", 10).await?;
    println!("  Search 'shirt': {} results", search_results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
